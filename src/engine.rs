use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::VecDeque,
    fmt,
};

pub const ROWS: usize = 3;
pub const COLS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Symbol {
    SlotMachine,
    Diamond,
    Gift,
    Star,
    Clover,
    Bullseye,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::SlotMachine,
        Symbol::Diamond,
        Symbol::Gift,
        Symbol::Star,
        Symbol::Clover,
        Symbol::Bullseye,
    ];

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % Self::ALL.len()]
    }

    pub fn to_index(self) -> usize {
        match self {
            Symbol::SlotMachine => 0,
            Symbol::Diamond => 1,
            Symbol::Gift => 2,
            Symbol::Star => 3,
            Symbol::Clover => 4,
            Symbol::Bullseye => 5,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::SlotMachine => "🎰",
            Symbol::Diamond => "💎",
            Symbol::Gift => "🎁",
            Symbol::Star => "⭐",
            Symbol::Clover => "🍀",
            Symbol::Bullseye => "🎯",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// A line of three identical symbols that pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinLine {
    MiddleColumn,
    Row(usize),
}

impl WinLine {
    pub fn contains(self, row: usize, col: usize) -> bool {
        match self {
            WinLine::MiddleColumn => col == 1,
            WinLine::Row(r) => r == row,
        }
    }
}

/// Rows of symbols, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpinGrid(pub [[Symbol; COLS]; ROWS]);

impl SpinGrid {
    /// Each cell drawn independently and uniformly from [`Symbol::ALL`].
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut rows = [[Symbol::SlotMachine; COLS]; ROWS];
        for row in rows.iter_mut() {
            for cell in row.iter_mut() {
                *cell = Symbol::from_index(rng.random_range(0..Symbol::ALL.len()));
            }
        }
        Self(rows)
    }

    pub fn from_indices(indices: [[usize; COLS]; ROWS]) -> Self {
        Self(indices.map(|row| row.map(Symbol::from_index)))
    }

    pub fn rows(&self) -> &[[Symbol; COLS]; ROWS] {
        &self.0
    }

    pub fn cell(&self, row: usize, col: usize) -> Symbol {
        self.0[row][col]
    }

    pub fn winning_lines(&self) -> Vec<WinLine> {
        let g = &self.0;
        let mut lines = Vec::new();
        if all_same(g[0][1], g[1][1], g[2][1]) {
            lines.push(WinLine::MiddleColumn);
        }
        for (r, row) in g.iter().enumerate() {
            if all_same(row[0], row[1], row[2]) {
                lines.push(WinLine::Row(r));
            }
        }
        lines
    }

    pub fn is_win(&self) -> bool {
        !self.winning_lines().is_empty()
    }
}

fn all_same(a: Symbol, b: Symbol, c: Symbol) -> bool {
    a == b && b == c
}

/// Source of spin grids for a session.
pub trait Reels {
    fn draw(&mut self) -> SpinGrid;
}

pub struct RandomReels<R> {
    rng: R,
}

impl<R: Rng> RandomReels<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomReels<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> Reels for RandomReels<R> {
    fn draw(&mut self) -> SpinGrid {
        SpinGrid::random(&mut self.rng)
    }
}

/// Replays a fixed queue of grids, then repeats the last one.
#[derive(Clone, Debug)]
pub struct ScriptedReels {
    queue: VecDeque<SpinGrid>,
    last: SpinGrid,
}

impl ScriptedReels {
    pub fn new(grids: impl IntoIterator<Item = SpinGrid>) -> Self {
        let queue: VecDeque<SpinGrid> = grids.into_iter().collect();
        let last = queue
            .back()
            .copied()
            .unwrap_or_else(|| SpinGrid::from_indices([[0, 1, 2], [3, 4, 5], [1, 2, 3]]));
        Self { queue, last }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl Reels for ScriptedReels {
    fn draw(&mut self) -> SpinGrid {
        self.queue.pop_front().unwrap_or(self.last)
    }
}
