//! Board state representation and basic operations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scan directions for runs: horizontal, vertical, diagonal, anti-diagonal.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | '_' | '-' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' | '0' => Some(Cell::O),
            _ => None,
        }
    }

    /// Signed code used by canonical keys: X = 1, O = -1, empty = 0.
    pub fn code(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::X => 1,
            Cell::O => -1,
        }
    }

    pub fn to_player(self) -> Option<Player> {
        match self {
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
            Cell::Empty => None,
        }
    }
}

/// A player in the game. X always opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Convert player to cell
    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }

    /// +1 for X, -1 for O
    pub fn sign(self) -> i8 {
        self.to_cell().code()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell().to_char())
    }
}

/// A move, addressed by row and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub const fn new(row: usize, col: usize) -> Self {
        Move { row, col }
    }
}

impl From<(usize, usize)> for Move {
    fn from((row, col): (usize, usize)) -> Self {
        Move { row, col }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Outcome of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

impl GameOutcome {
    /// Terminal reward from `player`'s point of view: win 1, draw 0, loss -1.
    pub fn reward_for(self, player: Player) -> f64 {
        match self {
            GameOutcome::Win(winner) if winner == player => 1.0,
            GameOutcome::Win(_) => -1.0,
            GameOutcome::Draw => 0.0,
        }
    }
}

/// Complete board state: grid, run length needed to win and whose turn it is.
///
/// Cells are stored row-major. The board size is fixed at construction and
/// the state only changes through [`GameState::apply_move`]; searchers always
/// work on their own clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    size: usize,
    win_length: usize,
    cells: Vec<Cell>,
    to_move: Player,
}

impl GameState {
    /// Create an empty `size`×`size` board where `win_length` in a row wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the size is zero or the
    /// win length is not in `1..=size`.
    pub fn new(size: usize, win_length: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfiguration {
                message: "board size must be at least 1".to_string(),
            });
        }
        if win_length == 0 || win_length > size {
            return Err(Error::InvalidConfiguration {
                message: format!("win length {win_length} must be between 1 and {size}"),
            });
        }
        Ok(GameState {
            size,
            win_length,
            cells: vec![Cell::Empty; size * size],
            to_move: Player::X,
        })
    }

    /// The classic 3×3 board, three in a row, X to move.
    pub fn standard() -> Self {
        GameState {
            size: 3,
            win_length: 3,
            cells: vec![Cell::Empty; 9],
            to_move: Player::X,
        }
    }

    /// Parse a board from text such as `"XX. / OO. / ..."`.
    ///
    /// Whitespace, `/` and `|` are ignored. The number of remaining cells must
    /// be a perfect square. The player to move is inferred from the piece
    /// counts (X opens).
    pub fn from_string(s: &str, win_length: usize) -> Result<Self> {
        let chars: Vec<char> = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '/' && *c != '|')
            .collect();
        let size = (chars.len() as f64).sqrt().round() as usize;
        if size == 0 || size * size != chars.len() {
            return Err(Error::InvalidBoardString {
                expected: size.max(1) * size.max(1),
                got: chars.len(),
                context: s.to_string(),
            });
        }

        let mut state = Self::new(size, win_length)?;
        for (i, &c) in chars.iter().enumerate() {
            state.cells[i] = Cell::from_char(c).ok_or_else(|| Error::InvalidCellCharacter {
                character: c,
                position: i,
                context: s.to_string(),
            })?;
        }

        let x_count = state.count(Cell::X);
        let o_count = state.count(Cell::O);
        state.to_move = if x_count == o_count {
            Player::X
        } else if x_count == o_count + 1 {
            Player::O
        } else {
            return Err(Error::InvalidPieceCounts { x_count, o_count });
        };
        Ok(state)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether the board is 3×3, whatever the win length.
    ///
    /// Exhaustive search and the full rule cascade key on this.
    pub fn is_standard(&self) -> bool {
        self.size == 3
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Cell at (row, col). Panics when out of range.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.size + col]
    }

    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        self.in_bounds(row, col) && self.get(row, col) == Cell::Empty
    }

    fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len() - self.empty_count()
    }

    pub fn empty_count(&self) -> usize {
        self.count(Cell::Empty)
    }

    /// Place the current player's mark at (row, col) and pass the turn.
    ///
    /// Returns `false` without touching the board when the coordinates are
    /// out of range or the cell is occupied.
    pub fn apply_move(&mut self, row: usize, col: usize) -> bool {
        if !self.is_empty(row, col) {
            return false;
        }
        self.cells[row * self.size + col] = self.to_move.to_cell();
        self.to_move = self.to_move.opponent();
        true
    }

    /// Clone-and-apply. `None` when the move is illegal.
    #[must_use = "after_move returns a new state; the original is unchanged"]
    pub fn after_move(&self, mv: Move) -> Option<GameState> {
        let mut next = self.clone();
        next.apply_move(mv.row, mv.col).then_some(next)
    }

    /// Copy of this state with a different player to move.
    #[must_use = "with_to_move returns a new state; the original is unchanged"]
    pub fn with_to_move(&self, player: Player) -> GameState {
        let mut state = self.clone();
        state.to_move = player;
        state
    }

    /// Empty cells in row-major order
    pub fn legal_moves(&self) -> Vec<Move> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .map(|(i, _)| Move::new(i / self.size, i % self.size))
            .collect()
    }

    /// Winner if any run of `win_length` exists, `Draw` on a full board,
    /// `None` while the game is in progress.
    pub fn winner(&self) -> Option<GameOutcome> {
        if let Some(player) = self.find_run() {
            return Some(GameOutcome::Win(player));
        }
        if self.empty_count() == 0 {
            return Some(GameOutcome::Draw);
        }
        None
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some()
    }

    /// Whether `player` owns a winning run
    pub fn has_won(&self, player: Player) -> bool {
        self.find_run() == Some(player)
    }

    fn find_run(&self) -> Option<Player> {
        for row in 0..self.size {
            for col in 0..self.size {
                let Some(player) = self.get(row, col).to_player() else {
                    continue;
                };
                if DIRECTIONS
                    .iter()
                    .any(|&(dr, dc)| self.run_length(row, col, dr, dc, player) >= self.win_length)
                {
                    return Some(player);
                }
            }
        }
        None
    }

    /// Length of the run of `player` marks starting at (row, col), scanning
    /// forward only, capped at `win_length`.
    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, player: Player) -> usize {
        let target = player.to_cell();
        let (mut r, mut c) = (row as isize, col as isize);
        let mut length = 0;
        let n = self.size as isize;
        while r >= 0 && r < n && c >= 0 && c < n && self.get(r as usize, c as usize) == target {
            length += 1;
            if length >= self.win_length {
                break;
            }
            r += dr;
            c += dc;
        }
        length
    }

    /// Central cell (lower-right of the centre block on even boards)
    pub fn center(&self) -> Move {
        Move::new(self.size / 2, self.size / 2)
    }

    /// The four corners in reading order
    pub fn corners(&self) -> [Move; 4] {
        let last = self.size - 1;
        [
            Move::new(0, 0),
            Move::new(0, last),
            Move::new(last, 0),
            Move::new(last, last),
        ]
    }

    pub fn is_corner(&self, mv: Move) -> bool {
        self.corners().contains(&mv)
    }

    pub(crate) fn from_parts(size: usize, win_length: usize, cells: Vec<Cell>, to_move: Player) -> Self {
        debug_assert_eq!(cells.len(), size * size);
        GameState {
            size,
            win_length,
            cells,
            to_move,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            let line: Vec<String> = (0..self.size)
                .map(|col| self.get(row, col).to_char().to_string())
                .collect();
            write!(f, "{}", line.join(" "))?;
            if row + 1 < self.size {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
