//! Teams, roles and per-seat data storage.
//!
//! ## Seat
//!
//! A match has exactly four seats: a spymaster and an operative for each
//! of the two teams. `Seat` is the `(Team, Role)` pair.
//!
//! ## SeatMap
//!
//! Fixed per-seat storage in the canonical order red spymaster, red
//! operative, blue spymaster, blue operative. The same order is used by
//! score records and reward vectors.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two teams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// Both teams, red first.
    pub fn all() -> impl Iterator<Item = Team> {
        [Team::Red, Team::Blue].into_iter()
    }

    /// The opposing team.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Wire name (`red` / `blue`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "red" => Some(Team::Red),
            "blue" => Some(Team::Blue),
            _ => None,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seat role within a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees the full board and gives clues.
    Spymaster,
    /// Sees only revealed colours and guesses words.
    Operative,
}

impl Role {
    /// Wire name (`spymaster` / `operative`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Spymaster => "spymaster",
            Role::Operative => "operative",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(Team, Role)` position at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seat {
    pub team: Team,
    pub role: Role,
}

impl Seat {
    pub const RED_SPYMASTER: Seat = Seat::new(Team::Red, Role::Spymaster);
    pub const RED_OPERATIVE: Seat = Seat::new(Team::Red, Role::Operative);
    pub const BLUE_SPYMASTER: Seat = Seat::new(Team::Blue, Role::Spymaster);
    pub const BLUE_OPERATIVE: Seat = Seat::new(Team::Blue, Role::Operative);

    /// Create a seat.
    #[must_use]
    pub const fn new(team: Team, role: Role) -> Self {
        Self { team, role }
    }

    /// Position within `SeatMap` order.
    #[must_use]
    pub const fn index(self) -> usize {
        match (self.team, self.role) {
            (Team::Red, Role::Spymaster) => 0,
            (Team::Red, Role::Operative) => 1,
            (Team::Blue, Role::Spymaster) => 2,
            (Team::Blue, Role::Operative) => 3,
        }
    }

    /// All four seats in canonical order.
    ///
    /// ```
    /// use clue_arena::core::{Seat, Team};
    ///
    /// let seats: Vec<_> = Seat::all().collect();
    /// assert_eq!(seats.len(), 4);
    /// assert_eq!(seats[2].team, Team::Blue);
    /// ```
    pub fn all() -> impl Iterator<Item = Seat> {
        [
            Seat::RED_SPYMASTER,
            Seat::RED_OPERATIVE,
            Seat::BLUE_SPYMASTER,
            Seat::BLUE_OPERATIVE,
        ]
        .into_iter()
    }

    /// Short column code used by the ledger (`rs`, `ro`, `bs`, `bo`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self.index() {
            0 => "rs",
            1 => "ro",
            2 => "bs",
            _ => "bo",
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.team, self.role)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use clue_arena::core::{Seat, SeatMap};
///
/// let mut misses: SeatMap<u8> = SeatMap::with_value(0);
/// misses[Seat::BLUE_OPERATIVE] += 1;
/// assert_eq!(misses[Seat::BLUE_OPERATIVE], 1);
/// assert_eq!(misses[Seat::RED_SPYMASTER], 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatMap<T> {
    data: [T; 4],
}

impl<T> SeatMap<T> {
    /// Create a SeatMap with values from a factory function.
    pub fn new(mut factory: impl FnMut(Seat) -> T) -> Self {
        Self {
            data: [
                factory(Seat::RED_SPYMASTER),
                factory(Seat::RED_OPERATIVE),
                factory(Seat::BLUE_SPYMASTER),
                factory(Seat::BLUE_OPERATIVE),
            ],
        }
    }

    /// Build from values already in canonical order.
    pub fn from_array(data: [T; 4]) -> Self {
        Self { data }
    }

    /// Create a SeatMap with all entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Get a reference to a seat's data.
    #[must_use]
    pub fn get(&self, seat: Seat) -> &T {
        &self.data[seat.index()]
    }

    /// Get a mutable reference to a seat's data.
    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        &mut self.data[seat.index()]
    }

    /// Iterate over (Seat, &T) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        Seat::all().zip(self.data.iter())
    }

    /// Map every value, keeping seat order.
    pub fn map<U>(&self, mut f: impl FnMut(Seat, &T) -> U) -> SeatMap<U> {
        SeatMap::new(|seat| f(seat, self.get(seat)))
    }

    /// Borrow the values in canonical order.
    #[must_use]
    pub fn as_array(&self) -> &[T; 4] {
        &self.data
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        self.get(seat)
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        self.get_mut(seat)
    }
}
