//! D4 symmetry group operations for board canonicalization

use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::{GameState, Move};

/// D4 symmetry transformation (dihedral group of the square)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct D4Transform {
    /// Rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,
    /// Whether to apply reflection
    pub reflection: bool,
}

impl D4Transform {
    /// Create identity transform
    pub fn identity() -> Self {
        D4Transform {
            rotation: 0,
            reflection: false,
        }
    }

    /// Get all 8 D4 transforms, identity first
    pub fn all() -> [D4Transform; 8] {
        let mut transforms = [D4Transform::identity(); 8];
        for (i, rotation) in [0, 90, 180, 270].into_iter().enumerate() {
            transforms[2 * i] = D4Transform {
                rotation,
                reflection: false,
            };
            transforms[2 * i + 1] = D4Transform {
                rotation,
                reflection: true,
            };
        }
        transforms
    }

    /// Apply transform to a move on a `size`×`size` board
    pub fn transform_move(&self, mv: Move, size: usize) -> Move {
        let last = size - 1;
        let (mut row, mut col) = (mv.row, mv.col);

        // Reflect across the vertical axis first, then rotate clockwise.
        if self.reflection {
            col = last - col;
        }
        for _ in 0..(self.rotation / 90) {
            let new_row = col;
            let new_col = last - row;
            row = new_row;
            col = new_col;
        }

        Move::new(row, col)
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> D4Transform {
        if self.reflection {
            // Reflect-then-rotate compositions are all involutions.
            *self
        } else {
            D4Transform {
                rotation: (360 - self.rotation) % 360,
                reflection: false,
            }
        }
    }
}

/// Symmetry-reduced key of a board position.
///
/// Holds the flattened grid (X = 1, O = -1, empty = 0) of the
/// lexicographically smallest of the 8 dihedral images.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    size: usize,
    cells: Vec<i8>,
}

impl StateKey {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    fn of(state: &GameState) -> Self {
        StateKey {
            size: state.size(),
            cells: state.cells().iter().map(|c| c.code()).collect(),
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &code in &self.cells {
            let c = match code {
                1 => 'X',
                -1 => 'O',
                _ => '.',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Cached result of canonicalization.
///
/// Keeps the transform that maps the original board onto its canonical
/// image, so moves can be carried in and out of the canonical frame.
#[derive(Debug, Clone)]
pub struct CanonicalContext {
    pub key: StateKey,
    pub transform: D4Transform,
}

impl CanonicalContext {
    /// Map a move from original coordinates to canonical coordinates
    pub fn map_move_to_canonical(&self, original: Move) -> Move {
        self.transform.transform_move(original, self.key.size)
    }

    /// Map a move from canonical coordinates back to original coordinates
    pub fn map_canonical_to_original(&self, canonical: Move) -> Move {
        self.transform
            .inverse()
            .transform_move(canonical, self.key.size)
    }
}

impl GameState {
    /// Apply a D4 transform to the board. The player to move is unchanged.
    pub fn transform(&self, t: &D4Transform) -> GameState {
        let size = self.size();
        let mut cells = self.cells().to_vec();
        for mv in self.all_cells() {
            let target = t.transform_move(mv, size);
            cells[target.row * size + target.col] = self.get(mv.row, mv.col);
        }
        GameState::from_parts(size, self.win_length(), cells, self.to_move())
    }

    fn all_cells(&self) -> impl Iterator<Item = Move> + '_ {
        let size = self.size();
        (0..size * size).map(move |i| Move::new(i / size, i % size))
    }

    /// Search all 8 transforms for the smallest key.
    ///
    /// Ties keep the first transform found, so the mapping is stable for a
    /// given board.
    pub fn canonical_context(&self) -> CanonicalContext {
        let mut best = CanonicalContext {
            key: StateKey::of(self),
            transform: D4Transform::identity(),
        };

        for transform in D4Transform::all().into_iter().skip(1) {
            let key = StateKey::of(&self.transform(&transform));
            if key < best.key {
                best = CanonicalContext { key, transform };
            }
        }

        best
    }

    pub fn canonical_key(&self) -> StateKey {
        self.canonical_context().key
    }
}
