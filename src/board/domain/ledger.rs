//! Per-user board orderings and the index arithmetic applied to them.
//!
//! A [`UserBoard`] holds every placement of one user. For each column the
//! positions form the dense sequence `1..=N`; every mutation here preserves
//! that. A [`PositionLedger`] groups the boards touched by one operation and
//! applies a task move or a fanout seed across all of them.

use super::{Placement, Position, TaskDomainError, TaskId, TaskStatus, UserId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    column: TaskStatus,
    position: Position,
}

/// Result of moving one placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The placement already occupied the requested slot.
    Unchanged,
    /// The placement moved.
    Moved {
        /// Placement before the move.
        from: Placement,
        /// Placement after the move.
        to: Placement,
    },
}

impl MoveOutcome {
    /// Returns `true` when the placement did not move.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Every placement of one user, with change tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBoard {
    user_id: UserId,
    slots: BTreeMap<TaskId, Slot>,
    loaded: BTreeMap<TaskId, Slot>,
}

impl UserBoard {
    /// Creates a board with no placements.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            slots: BTreeMap::new(),
            loaded: BTreeMap::new(),
        }
    }

    /// Builds a board from the placements persisted for `user_id`.
    ///
    /// Placements belonging to other users are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DuplicatePlacement`] when the same task is
    /// placed twice.
    pub fn from_placements(
        user_id: UserId,
        placements: impl IntoIterator<Item = Placement>,
    ) -> Result<Self, TaskDomainError> {
        let mut slots = BTreeMap::new();
        for placement in placements {
            if placement.user_id != user_id {
                continue;
            }
            let slot = Slot {
                column: placement.column,
                position: placement.position,
            };
            if slots.insert(placement.task_id, slot).is_some() {
                return Err(TaskDomainError::DuplicatePlacement {
                    user_id,
                    task_id: placement.task_id,
                });
            }
        }
        Ok(Self {
            user_id,
            loaded: slots.clone(),
            slots,
        })
    }

    /// Returns the board owner.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the placement of `task_id`, if the task is on this board.
    #[must_use]
    pub fn placement(&self, task_id: TaskId) -> Option<Placement> {
        self.slots
            .get(&task_id)
            .map(|slot| self.to_placement(task_id, *slot))
    }

    /// Returns `true` when the task is on this board.
    #[must_use]
    pub fn contains(&self, task_id: TaskId) -> bool {
        self.slots.contains_key(&task_id)
    }

    /// Returns every placement on the board.
    #[must_use]
    pub fn placements(&self) -> Vec<Placement> {
        self.slots
            .iter()
            .map(|(task_id, slot)| self.to_placement(*task_id, *slot))
            .collect()
    }

    /// Returns the placements of one column ordered by position.
    #[must_use]
    pub fn column(&self, column: TaskStatus) -> Vec<Placement> {
        let mut placements: Vec<Placement> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.column == column)
            .map(|(task_id, slot)| self.to_placement(*task_id, *slot))
            .collect();
        placements.sort_by_key(|placement| (placement.position, placement.task_id));
        placements
    }

    /// Returns the number of cards in a column.
    #[must_use]
    pub fn column_len(&self, column: TaskStatus) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.column == column)
            .count()
    }

    /// Returns the slot after the highest occupied position in `column`, or
    /// the first slot when the column is empty.
    #[must_use]
    pub fn next_position(&self, column: TaskStatus) -> Position {
        self.slots
            .values()
            .filter(|slot| slot.column == column)
            .map(|slot| slot.position)
            .max()
            .map_or(Position::FIRST, Position::succ)
    }

    /// Returns the lowest position in `column` no card occupies.
    #[must_use]
    pub fn first_free_position(&self, column: TaskStatus) -> Position {
        let mut occupied: Vec<Position> = self
            .slots
            .values()
            .filter(|slot| slot.column == column)
            .map(|slot| slot.position)
            .collect();
        occupied.sort_unstable();
        occupied.dedup();
        let mut candidate = Position::FIRST;
        for position in occupied {
            if position != candidate {
                break;
            }
            candidate = candidate.succ();
        }
        candidate
    }

    /// Returns `true` when `column` holds exactly the positions `1..=N`.
    #[must_use]
    pub fn is_dense(&self, column: TaskStatus) -> bool {
        self.column(column)
            .iter()
            .zip(1_u32..)
            .all(|(placement, expected)| placement.position.value() == expected)
    }

    /// Returns `true` when every column is dense.
    #[must_use]
    pub fn is_dense_everywhere(&self) -> bool {
        TaskStatus::ALL.into_iter().all(|column| self.is_dense(column))
    }

    /// Places a task that is not yet on this board at `position` in
    /// `column`.
    ///
    /// A free slot (a gap, or the slot after the last card) is filled as is.
    /// An occupied slot is opened by shifting the cards at or after it down
    /// by one. A position past the end of the column is clamped to the slot
    /// after the last card.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DuplicatePlacement`] when the task is
    /// already on the board.
    pub fn place(
        &mut self,
        task_id: TaskId,
        column: TaskStatus,
        position: Position,
    ) -> Result<Placement, TaskDomainError> {
        if self.contains(task_id) {
            return Err(TaskDomainError::DuplicatePlacement {
                user_id: self.user_id,
                task_id,
            });
        }
        let target = position.min(self.next_position(column));
        if self.is_occupied(column, target) {
            self.open_slot(column, target);
        }
        let slot = Slot {
            column,
            position: target,
        };
        self.slots.insert(task_id, slot);
        Ok(self.to_placement(task_id, slot))
    }

    /// Moves a card to `position` in `column`.
    ///
    /// The gap left in the source column is closed and the cards at or after
    /// the target slot shift down by one. A reorder within one column removes
    /// the card before reinserting it, so the column stays dense. Targets
    /// past the end of the column are clamped to the last slot. Moving a
    /// card onto the slot it occupies changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PlacementNotFound`] when the task is not on
    /// this board.
    pub fn move_to(
        &mut self,
        task_id: TaskId,
        column: TaskStatus,
        position: Position,
    ) -> Result<MoveOutcome, TaskDomainError> {
        let current = self.slot(task_id)?;
        if current.column == column && current.position == position {
            return Ok(MoveOutcome::Unchanged);
        }

        self.detach(task_id, current);
        let target = position.min(self.next_position(column));
        self.open_slot(column, target);
        let moved = Slot {
            column,
            position: target,
        };
        self.slots.insert(task_id, moved);

        if moved == current {
            return Ok(MoveOutcome::Unchanged);
        }
        Ok(MoveOutcome::Moved {
            from: self.to_placement(task_id, current),
            to: self.to_placement(task_id, moved),
        })
    }

    /// Moves a card to the end of `column`, after this user's last card
    /// there.
    ///
    /// A card already in `column` keeps its slot.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PlacementNotFound`] when the task is not on
    /// this board.
    pub fn append_to(
        &mut self,
        task_id: TaskId,
        column: TaskStatus,
    ) -> Result<MoveOutcome, TaskDomainError> {
        let current = self.slot(task_id)?;
        if current.column == column {
            return Ok(MoveOutcome::Unchanged);
        }

        self.detach(task_id, current);
        let moved = Slot {
            column,
            position: self.next_position(column),
        };
        self.slots.insert(task_id, moved);
        Ok(MoveOutcome::Moved {
            from: self.to_placement(task_id, current),
            to: self.to_placement(task_id, moved),
        })
    }

    /// Returns the placements whose column or position differs from what
    /// the board was loaded with, including newly placed tasks.
    #[must_use]
    pub fn changes(&self) -> Vec<Placement> {
        self.slots
            .iter()
            .filter(|(task_id, slot)| self.loaded.get(*task_id) != Some(*slot))
            .map(|(task_id, slot)| self.to_placement(*task_id, *slot))
            .collect()
    }

    /// Returns `true` when the board differs from what it was loaded with.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.slots != self.loaded
    }

    fn slot(&self, task_id: TaskId) -> Result<Slot, TaskDomainError> {
        self.slots
            .get(&task_id)
            .copied()
            .ok_or(TaskDomainError::PlacementNotFound {
                user_id: self.user_id,
                task_id,
            })
    }

    fn is_occupied(&self, column: TaskStatus, position: Position) -> bool {
        self.slots
            .values()
            .any(|slot| slot.column == column && slot.position == position)
    }

    /// Removes a card and closes the gap it leaves in its column.
    fn detach(&mut self, task_id: TaskId, current: Slot) {
        self.slots.remove(&task_id);
        for slot in self.slots.values_mut() {
            if slot.column == current.column && slot.position > current.position {
                slot.position = slot.position.pred();
            }
        }
    }

    /// Shifts the cards at or after `position` in `column` down by one.
    fn open_slot(&mut self, column: TaskStatus, position: Position) {
        for slot in self.slots.values_mut() {
            if slot.column == column && slot.position >= position {
                slot.position = slot.position.succ();
            }
        }
    }

    const fn to_placement(&self, task_id: TaskId, slot: Slot) -> Placement {
        Placement::new(self.user_id, task_id, slot.column, slot.position)
    }
}

/// How a fanout chooses a new card's slot in each stakeholder's column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// After the stakeholder's last card.
    Append,
    /// At the lowest unused position.
    FirstFree,
}

/// Effect of one task move across all stakeholders' boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerMove {
    /// Outcome on the acting user's board.
    pub acting: MoveOutcome,
    /// Outcome on every other board holding the task, by board owner.
    pub others: Vec<(UserId, MoveOutcome)>,
}

impl LedgerMove {
    /// Returns `true` when no board changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.acting.is_unchanged() && self.others.iter().all(|(_, outcome)| outcome.is_unchanged())
    }
}

/// The boards touched by one ledger operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionLedger {
    boards: BTreeMap<UserId, UserBoard>,
}

impl PositionLedger {
    /// Creates a ledger over the given boards.
    #[must_use]
    pub fn new(boards: impl IntoIterator<Item = UserBoard>) -> Self {
        Self {
            boards: boards
                .into_iter()
                .map(|board| (board.user_id(), board))
                .collect(),
        }
    }

    /// Returns the board of `user_id`, if loaded.
    #[must_use]
    pub fn board(&self, user_id: UserId) -> Option<&UserBoard> {
        self.boards.get(&user_id)
    }

    /// Returns the loaded boards ordered by owner.
    pub fn boards(&self) -> impl Iterator<Item = &UserBoard> {
        self.boards.values()
    }

    /// Moves a task on the acting user's board and follows it on every
    /// other loaded board that holds it.
    ///
    /// The acting user's card takes the requested slot. On every other
    /// board the card joins `column` after that user's own last card, so
    /// the acting user's numbering never leaks into another board. When
    /// the acting user's card does not move, no board changes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PlacementNotFound`] when the acting user's
    /// board is not loaded or does not hold the task.
    pub fn move_placement(
        &mut self,
        task_id: TaskId,
        acting_user: UserId,
        column: TaskStatus,
        position: Position,
    ) -> Result<LedgerMove, TaskDomainError> {
        let acting_board =
            self.boards
                .get_mut(&acting_user)
                .ok_or(TaskDomainError::PlacementNotFound {
                    user_id: acting_user,
                    task_id,
                })?;
        let acting = acting_board.move_to(task_id, column, position)?;
        if acting.is_unchanged() {
            return Ok(LedgerMove {
                acting,
                others: Vec::new(),
            });
        }

        let mut others = Vec::new();
        for (user_id, board) in &mut self.boards {
            if *user_id == acting_user || !board.contains(task_id) {
                continue;
            }
            others.push((*user_id, board.append_to(task_id, column)?));
        }
        Ok(LedgerMove { acting, others })
    }

    /// Places a new task in `column` on every loaded board.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DuplicatePlacement`] when a board already
    /// holds the task.
    pub fn seed(
        &mut self,
        task_id: TaskId,
        column: TaskStatus,
        policy: SeedPolicy,
    ) -> Result<Vec<Placement>, TaskDomainError> {
        let mut seeded = Vec::with_capacity(self.boards.len());
        for board in self.boards.values_mut() {
            let position = match policy {
                SeedPolicy::Append => board.next_position(column),
                SeedPolicy::FirstFree => board.first_free_position(column),
            };
            seeded.push(board.place(task_id, column, position)?);
        }
        Ok(seeded)
    }

    /// Returns every changed placement across all boards.
    #[must_use]
    pub fn changes(&self) -> Vec<Placement> {
        self.boards.values().flat_map(UserBoard::changes).collect()
    }

    /// Consumes the ledger, returning its boards ordered by owner.
    #[must_use]
    pub fn into_boards(self) -> Vec<UserBoard> {
        self.boards.into_values().collect()
    }
}
