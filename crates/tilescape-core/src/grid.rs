use crate::{GridPos, TerrainError};

/// Fixed-size 2D array over a single row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Construct a `width * height` grid with every cell set to `fill`.
    pub fn new(width: usize, height: usize, fill: T) -> Result<Self, TerrainError> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![fill; width * height],
        })
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Grid<T> {
    /// Construct a grid by evaluating `f` for each position in row-major order.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(GridPos) -> T,
    ) -> Result<Self, TerrainError> {
        check_dimensions(width, height)?;
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f((x as i64, y as i64)));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Wrap an already row-major buffer.
    pub fn from_vec(width: usize, height: usize, cells: Vec<T>) -> Result<Self, TerrainError> {
        check_dimensions(width, height)?;
        if cells.len() != width * height {
            return Err(TerrainError::TileCountMismatch {
                expected: width * height,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, pos: GridPos) -> bool {
        self.offset(pos).is_some()
    }

    pub fn get(&self, pos: GridPos) -> Result<&T, TerrainError> {
        let idx = self.checked_offset(pos)?;
        Ok(&self.cells[idx])
    }

    pub fn get_mut(&mut self, pos: GridPos) -> Result<&mut T, TerrainError> {
        let idx = self.checked_offset(pos)?;
        Ok(&mut self.cells[idx])
    }

    /// Overwrite the cell at `pos`.
    pub fn set(&mut self, pos: GridPos, value: T) -> Result<(), TerrainError> {
        let idx = self.checked_offset(pos)?;
        self.cells[idx] = value;
        Ok(())
    }

    /// Cells with their positions, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, value)| (((idx % width) as i64, (idx / width) as i64), value))
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.cells
    }

    #[must_use]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Row-major offset for `pos`, if it lies inside the grid.
    #[inline]
    fn offset(&self, (x, y): GridPos) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn checked_offset(&self, pos: GridPos) -> Result<usize, TerrainError> {
        self.offset(pos).ok_or(TerrainError::OutOfBounds {
            x: pos.0,
            y: pos.1,
            width: self.width,
            height: self.height,
        })
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), TerrainError> {
    if width == 0 || height == 0 {
        return Err(TerrainError::InvalidConfig(
            "grid dimensions must be non-zero",
        ));
    }
    Ok(())
}
