//! The allocation table: one byte per data block, threading each file's
//! blocks into a singly-linked chain through the cell array.

use crate::config::TABLE_SIZE;
use crate::error::{FsError, Result};

/// Cell byte for an unallocated slot.
const FREE: u8 = 0xFE;
/// Cell byte ending a chain.
const END: u8 = 0xFF;

/// One allocation-table cell. An allocated cell either ends its chain or
/// names the cell holding the file's next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Free,
    End,
    Next(u8),
}

impl Cell {
    pub fn from_byte(b: u8) -> Self {
        match b {
            FREE => Cell::Free,
            END => Cell::End,
            n => Cell::Next(n),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Cell::Free => FREE,
            Cell::End => END,
            Cell::Next(n) => n,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllocationTable {
    cells: [Cell; TABLE_SIZE],
    next_free: Option<usize>,
    storing: usize,
}

impl AllocationTable {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Free; TABLE_SIZE],
            next_free: Some(0),
            storing: 0,
        }
    }

    /// Rebuilds the table from its on-disk bytes, recomputing the free
    /// cursor (lowest free cell) and the occupancy count.
    pub fn decode(buf: &[u8; TABLE_SIZE]) -> Self {
        let mut table = Self {
            cells: [Cell::Free; TABLE_SIZE],
            next_free: None,
            storing: 0,
        };
        for (i, &b) in buf.iter().enumerate() {
            let cell = Cell::from_byte(b);
            table.cells[i] = cell;
            if cell == Cell::Free {
                if table.next_free.is_none() {
                    table.next_free = Some(i);
                }
            } else {
                table.storing += 1;
            }
        }
        table
    }

    pub fn encode(&self) -> [u8; TABLE_SIZE] {
        let mut buf = [0u8; TABLE_SIZE];
        for (i, cell) in self.cells.iter().enumerate() {
            buf[i] = cell.to_byte();
        }
        buf
    }

    pub fn cell(&self, index: usize) -> Result<Cell> {
        self.cells.get(index).copied().ok_or(FsError::OutOfBounds)
    }

    /// Lowest free cell, or none when the table is full.
    pub fn next_free(&self) -> Option<usize> {
        self.next_free
    }

    /// Count of allocated cells.
    pub fn storing(&self) -> usize {
        self.storing
    }

    /// Linear scan from `from` upward for the first free cell.
    pub fn find_free_from(&self, from: usize) -> Option<usize> {
        (from..TABLE_SIZE).find(|&i| self.cells[i] == Cell::Free)
    }

    /// Claims the lowest free cell as a fresh one-block chain.
    pub fn allocate_start(&mut self) -> Result<usize> {
        let index = self.next_free.ok_or(FsError::TableFull)?;
        self.cells[index] = Cell::End;
        self.storing += 1;
        self.next_free = self.find_free_from(index + 1);
        Ok(index)
    }

    /// Extends the chain whose full tail is `after`, linking it to a newly
    /// claimed cell. On exhaustion the existing chain is left untouched.
    pub fn allocate_next(&mut self, after: usize) -> Result<usize> {
        if after >= TABLE_SIZE {
            return Err(FsError::OutOfBounds);
        }
        let index = self.next_free.ok_or(FsError::TableFull)?;
        self.cells[after] = Cell::Next(index as u8);
        self.cells[index] = Cell::End;
        self.storing += 1;
        self.next_free = self.find_free_from(index + 1);
        Ok(index)
    }

    /// Re-allocates a cell that a clear just freed, as a one-block chain.
    /// Overwriting keeps a file on its original first block this way.
    pub fn reclaim(&mut self, index: usize) -> Result<()> {
        if self.cell(index)? != Cell::Free {
            return Err(FsError::OutOfBounds);
        }
        self.cells[index] = Cell::End;
        self.storing += 1;
        if self.next_free == Some(index) {
            self.next_free = self.find_free_from(index + 1);
        }
        Ok(())
    }

    /// Frees every cell of the chain starting at `start`, clearing each
    /// freed block's content through `clear_block`. All-or-nothing: any
    /// failure restores every cell freed so far, the occupancy count, and
    /// the free cursor, then propagates, so callers must treat the chain
    /// as still allocated.
    pub fn clear_chain(
        &mut self,
        start: usize,
        clear_block: &mut impl FnMut(usize) -> Result<()>,
    ) -> Result<()> {
        // Walk the chain head-to-tail first; a corrupt link fails here
        // before anything is touched.
        let mut chain = Vec::with_capacity(TABLE_SIZE);
        let mut index = start;
        loop {
            if chain.len() >= TABLE_SIZE {
                return Err(FsError::OutOfBounds);
            }
            match self.cell(index)? {
                Cell::Free => return Err(FsError::OutOfBounds),
                Cell::End => {
                    chain.push(index);
                    break;
                }
                Cell::Next(n) => {
                    chain.push(index);
                    index = n as usize;
                }
            }
        }

        let prior_free = self.next_free;
        let mut freed: Vec<(usize, Cell)> = Vec::with_capacity(chain.len());

        // Free the chain tail-first.
        for &i in chain.iter().rev() {
            let prior = self.cells[i];
            self.cells[i] = Cell::Free;
            self.storing -= 1;
            if let Err(e) = clear_block(i) {
                self.cells[i] = prior;
                self.storing += 1;
                for &(j, p) in freed.iter().rev() {
                    self.cells[j] = p;
                    self.storing += 1;
                }
                self.next_free = prior_free;
                return Err(e);
            }
            freed.push((i, prior));
            if self.next_free.is_none_or(|f| i < f) {
                self.next_free = Some(i);
            }
        }
        Ok(())
    }
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self::new()
    }
}
