//! # OccupancyGrid
//! Read-only 2-D free/obstacle field the planners search through.
//!
//! Cells are addressed as `(row, col)`. Positions are real valued and map to
//! the nearest cell, so the addressable coordinate range of each axis is
//! `[0, size - 1]`.
use crate::common::Point;
use crate::error::{RRTError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    // Row-major, `true` means free.
    free: Vec<bool>,
}

impl OccupancyGrid {
    /// An obstacle-free grid.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(RRTError::EmptyGrid);
        }
        Ok(Self {
            rows,
            cols,
            free: vec![true; rows * cols],
        })
    }

    /// Build from nested rows where `true` marks a free cell.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        if n_rows == 0 || n_cols == 0 {
            return Err(RRTError::EmptyGrid);
        }
        let mut free = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(RRTError::RaggedGrid {
                    row: i,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            free.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            free,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn max_row(&self) -> f64 {
        (self.rows - 1) as f64
    }

    pub fn max_col(&self) -> f64 {
        (self.cols - 1) as f64
    }

    pub fn set_occupied(&mut self, row: usize, col: usize) -> Result<()> {
        let idx = self.cell_index(row, col)?;
        self.free[idx] = false;
        Ok(())
    }

    pub fn set_free(&mut self, row: usize, col: usize) -> Result<()> {
        let idx = self.cell_index(row, col)?;
        self.free[idx] = true;
        Ok(())
    }

    /// Cells outside the grid count as obstacles.
    pub fn is_free_cell(&self, row: i64, col: i64) -> bool {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return false;
        }
        self.free[row as usize * self.cols + col as usize]
    }

    /// Free-space test for a real-valued position, rounded to the nearest cell.
    pub fn is_free(&self, p: &Point) -> bool {
        if !p[0].is_finite() || !p[1].is_finite() {
            return false;
        }
        self.is_free_cell(p[0].round() as i64, p[1].round() as i64)
    }

    pub fn contains(&self, p: &Point) -> bool {
        (0.0..=self.max_row()).contains(&p[0]) && (0.0..=self.max_col()).contains(&p[1])
    }

    /// Clamp each component into the addressable range.
    pub fn clamp(&self, p: &Point) -> Point {
        Point::new(p[0].clamp(0.0, self.max_row()), p[1].clamp(0.0, self.max_col()))
    }

    pub fn num_free(&self) -> usize {
        self.free.iter().filter(|f| **f).count()
    }

    pub(crate) fn check_inside(&self, which: &'static str, p: &Point) -> Result<()> {
        if self.contains(p) {
            return Ok(());
        }
        Err(RRTError::OutOfBounds {
            which,
            position: *p,
            rows: self.rows,
            cols: self.cols,
        })
    }

    fn cell_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(RRTError::OutOfBounds {
                which: "cell",
                position: Point::new(row as f64, col as f64),
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }
}
