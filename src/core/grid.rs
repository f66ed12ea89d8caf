//! Cell grid
//!
//! A rectangular grid of [`StyledCell`] rows. Used as a screen's back buffer,
//! as the record of what was last flushed to the device, and as the visible
//! state of the in-memory device.

use super::style::{Position, Size, StyledCell};

/// A single row
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub cells: Vec<StyledCell>,
}

impl Row {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![StyledCell::BLANK; cols as usize],
        }
    }

    pub fn resize(&mut self, new_cols: u16) {
        self.cells.resize(new_cols as usize, StyledCell::BLANK);
    }

    pub fn clear(&mut self) {
        self.cells.fill(StyledCell::BLANK);
    }

    /// Characters of the row as a string
    pub fn text(&self) -> String {
        self.cells.iter().map(|cell| cell.ch).collect()
    }
}

/// Grid of styled cells
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    size: Size,
    rows: Vec<Row>,
}

impl Grid {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            rows: (0..size.rows).map(|_| Row::new(size.cols)).collect(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Resize in place
    ///
    /// Cells that fall outside the new bounds are discarded; cells that come
    /// into bounds start blank.
    pub fn resize(&mut self, new_size: Size) {
        while self.rows.len() < new_size.rows as usize {
            self.rows.push(Row::new(new_size.cols));
        }
        self.rows.truncate(new_size.rows as usize);

        for row in &mut self.rows {
            row.resize(new_size.cols);
        }
        self.size = new_size;
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    pub fn get(&self, pos: Position) -> Option<&StyledCell> {
        self.rows
            .get(pos.row as usize)
            .and_then(|row| row.cells.get(pos.col as usize))
    }

    /// Store a cell; returns false (and stores nothing) outside the bounds
    pub fn set(&mut self, pos: Position, cell: StyledCell) -> bool {
        match self
            .rows
            .get_mut(pos.row as usize)
            .and_then(|row| row.cells.get_mut(pos.col as usize))
        {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, row: u16) -> Option<&Row> {
        self.rows.get(row as usize)
    }

    /// Row-major iteration over every position and its cell
    pub fn cells(&self) -> impl Iterator<Item = (Position, &StyledCell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.cells
                .iter()
                .enumerate()
                .map(move |(c, cell)| (Position::new(c as u16, r as u16), cell))
        })
    }

    /// Positions whose cells differ from `other`
    ///
    /// Rows that compare equal are skipped as a whole. Positions that only
    /// exist in `self` count as changed.
    pub fn diff<'a>(&'a self, other: &'a Grid) -> impl Iterator<Item = (Position, &'a StyledCell)> + 'a {
        self.rows.iter().enumerate().flat_map(move |(r, row)| {
            let prev = other.rows.get(r);
            let unchanged = prev.map_or(false, |prev| prev == row);
            row.cells
                .iter()
                .enumerate()
                .filter(move |(c, cell)| {
                    !unchanged && prev.and_then(|p| p.cells.get(*c)) != Some(*cell)
                })
                .map(move |(c, cell)| (Position::new(c as u16, r as u16), cell))
        })
    }
}
