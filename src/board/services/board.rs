//! Task board orchestration: creation with stakeholder fanout, card moves,
//! duplication, board reads and the audit trail.

use super::{
    CreateTaskRequest, DuplicateTaskRequest, MoveTaskRequest, TaskBoardError, TaskBoardResult,
};
use crate::board::{
    domain::{
        BoardFilter, KanbanBoard, LedgerMove, Placement, Position, PositionLedger,
        PrivilegedRoles, Schedule,
        SeedPolicy, StatusChange, StatusLogEntry, Stakeholders, Task, TaskEdit, TaskId,
        TaskStatus, UNKNOWN_ACTOR_NAME, UserBoard, UserId, sort_newest_first,
    },
    ports::{BoardStore, BoardTransaction, UserDirectory},
};
use crate::config::BoardConfig;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a batch entry was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The assignee already holds their daily maximum of open tasks.
    LimitExceeded,
    /// The assignee is unknown to the directory.
    UnknownAssignee,
}

/// A batch entry that was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedTask {
    /// Index of the entry in the submitted batch.
    pub index: usize,
    /// Assignee of the skipped entry.
    pub assignee_id: UserId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of a batch creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchCreateOutcome {
    /// Tasks created, in submission order.
    pub created: Vec<Task>,
    /// Entries skipped, in submission order.
    pub skipped: Vec<SkippedTask>,
}

/// A validated task awaiting insertion.
struct PendingTask {
    task: Task,
    stakeholders: Stakeholders,
    daily_limit: u32,
}

enum BatchEntry {
    Pending { index: usize, pending: PendingTask },
    Unknown { index: usize, assignee_id: UserId },
}

/// Task board orchestration service.
pub struct TaskBoardService<S, D, C>
where
    S: BoardStore,
    D: UserDirectory,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    directory: Arc<D>,
    clock: Arc<C>,
    config: Arc<BoardConfig>,
    privileged: PrivilegedRoles,
}

impl<S, D, C> Clone for TaskBoardService<S, D, C>
where
    S: BoardStore,
    D: UserDirectory,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
            config: Arc::clone(&self.config),
            privileged: self.privileged.clone(),
        }
    }
}

impl<S, D, C> TaskBoardService<S, D, C>
where
    S: BoardStore,
    D: UserDirectory,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a service with the default configuration.
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self::with_config(store, directory, clock, BoardConfig::default())
    }

    /// Creates a service with an explicit configuration.
    #[must_use]
    pub fn with_config(
        store: Arc<S>,
        directory: Arc<D>,
        clock: Arc<C>,
        config: BoardConfig,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            privileged: config.privileged(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration in force.
    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Creates a task and places it in `Todo` on every stakeholder's board.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::UserNotFound`] for an unknown assignee,
    /// [`TaskBoardError::LimitExceeded`] when the assignee's daily limit is
    /// reached, and [`TaskBoardError::Domain`] for invalid input.
    #[tracing::instrument(skip(self, request), fields(assignee_id = %request.assignee_id()))]
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskBoardResult<Task> {
        let draft = request.into_draft()?;
        let assignee_id = draft.assignee_id;
        let privileged = self.privileged_users().await?;
        let Some(daily_limit) = self.daily_limit_of(assignee_id).await? else {
            return Err(TaskBoardError::UserNotFound(assignee_id));
        };
        let pending = PendingTask {
            stakeholders: Stakeholders::resolve(assignee_id, privileged),
            task: Task::new(draft, &*self.clock),
            daily_limit,
        };

        let result = self
            .store
            .transact(move |tx| -> TaskBoardResult<Task> {
                let boards = lock_boards(tx, pending.stakeholders.iter())?;
                if !has_capacity(tx, &pending)? {
                    return Err(limit_exceeded(&pending));
                }
                insert_with_fanout(tx, &pending, boards, SeedPolicy::Append)?;
                Ok(pending.task)
            })
            .await;

        match result {
            Ok(task) => {
                info!(task_id = %task.id(), %assignee_id, "task created");
                Ok(task)
            }
            Err(err) => {
                if let TaskBoardError::LimitExceeded { day, limit, .. } = &err {
                    warn!(%assignee_id, %day, limit, "daily task limit reached");
                }
                Err(err)
            }
        }
    }

    /// Creates several tasks in one unit of work.
    ///
    /// Entries whose assignee is unknown or over their daily limit are
    /// skipped and reported; the limit check counts tasks created earlier in
    /// the same batch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Domain`] when any entry is invalid, in which
    /// case nothing is created.
    #[tracing::instrument(skip(self, requests), fields(batch_size = requests.len()))]
    pub async fn create_tasks(
        &self,
        requests: Vec<CreateTaskRequest>,
    ) -> TaskBoardResult<BatchCreateOutcome> {
        let drafts = requests
            .into_iter()
            .map(CreateTaskRequest::into_draft)
            .collect::<Result<Vec<_>, _>>()?;
        let privileged = self.privileged_users().await?;

        let mut entries = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.into_iter().enumerate() {
            let assignee_id = draft.assignee_id;
            let entry = match self.daily_limit_of(assignee_id).await? {
                Some(daily_limit) => BatchEntry::Pending {
                    index,
                    pending: PendingTask {
                        stakeholders: Stakeholders::resolve(
                            assignee_id,
                            privileged.iter().copied(),
                        ),
                        task: Task::new(draft, &*self.clock),
                        daily_limit,
                    },
                },
                None => BatchEntry::Unknown { index, assignee_id },
            };
            entries.push(entry);
        }

        let outcome = self
            .store
            .transact(move |tx| create_batch(tx, entries))
            .await?;

        for skipped in &outcome.skipped {
            debug!(
                index = skipped.index,
                assignee_id = %skipped.assignee_id,
                reason = ?skipped.reason,
                "batch entry skipped"
            );
        }
        info!(
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            "task batch created"
        );
        Ok(outcome)
    }

    /// Moves a task card on the acting user's board.
    ///
    /// The task row is locked before the transition guard runs, so the guard
    /// sees the latest committed status. The acting user's card takes the
    /// requested slot; every other stakeholder's card follows to the end of
    /// the same column on their own board. The status update and the audit
    /// entry are written in the same unit. Moving a card onto its current
    /// slot changes nothing and writes no audit entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::InvalidColumn`] for an unknown column,
    /// [`TaskBoardError::TaskNotFound`] for an unknown task,
    /// [`TaskBoardError::Domain`] when the guard rejects the move, the
    /// position is zero, or the acting user holds no card for the task.
    #[tracing::instrument(
        skip(self, request),
        fields(task_id = %request.task_id, user_id = %request.acting_user)
    )]
    pub async fn move_task(&self, request: MoveTaskRequest) -> TaskBoardResult<LedgerMove> {
        let column = TaskStatus::try_from(request.column.as_str())?;
        let position = Position::new(request.position)?;
        let MoveTaskRequest {
            task_id,
            acting_user,
            ..
        } = request;
        let actor_name = self.actor_name(acting_user).await?;
        let clock = Arc::clone(&self.clock);

        let result = self
            .store
            .transact(move |tx| -> TaskBoardResult<LedgerMove> {
                let mut task = tx
                    .lock_task(task_id)?
                    .ok_or(TaskBoardError::TaskNotFound(task_id))?;
                task.check_transition(column)?;

                let holders = tx.placement_holders(task_id)?;
                let mut ledger = PositionLedger::new(lock_boards(tx, holders)?);
                let ledger_move = ledger.move_placement(task_id, acting_user, column, position)?;
                if ledger_move.is_noop() {
                    return Ok(ledger_move);
                }

                for board in ledger.boards().filter(|board| board.has_changes()) {
                    tx.save_board(board)?;
                }
                let missed_deadline = task.is_overdue_at(clock.utc());
                let status_before = task.status();
                if status_before != column {
                    task.transition_to(column, &*clock)?;
                    tx.update_task(&task)?;
                }
                tx.append_status_log(&StatusLogEntry::record(
                    StatusChange {
                        task_id,
                        actor_id: acting_user,
                        actor_name,
                        status_before,
                        status_after: column,
                        missed_deadline,
                    },
                    &*clock,
                ))?;
                Ok(ledger_move)
            })
            .await;

        match result {
            Ok(ledger_move) if ledger_move.is_noop() => {
                debug!(%column, %position, "move left the board unchanged");
                Ok(ledger_move)
            }
            Ok(ledger_move) => {
                info!(
                    %column,
                    %position,
                    followers = ledger_move.others.len(),
                    "task moved"
                );
                Ok(ledger_move)
            }
            Err(err) => {
                if let TaskBoardError::Domain(domain_err) = &err {
                    warn!(error = %domain_err, "task move rejected");
                }
                Err(err)
            }
        }
    }

    /// Copies a task onto a new assignee and schedule.
    ///
    /// Each stakeholder's card lands in the first free `Todo` slot of their
    /// board. Duplicates are not counted against the daily limit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] for an unknown source task,
    /// [`TaskBoardError::UserNotFound`] for an unknown assignee and
    /// [`TaskBoardError::Domain`] for an invalid schedule.
    #[tracing::instrument(
        skip(self, request),
        fields(source_task_id = %request.source_task_id, assignee_id = %request.assignee_id)
    )]
    pub async fn duplicate_task(&self, request: DuplicateTaskRequest) -> TaskBoardResult<Task> {
        let schedule = Schedule::new(request.starts_at, request.deadline)?;
        let source = self.get_task(request.source_task_id).await?;
        let Some(daily_limit) = self.daily_limit_of(request.assignee_id).await? else {
            return Err(TaskBoardError::UserNotFound(request.assignee_id));
        };
        let privileged = self.privileged_users().await?;
        let pending = PendingTask {
            stakeholders: Stakeholders::resolve(request.assignee_id, privileged),
            task: source.duplicate(
                request.assignee_id,
                schedule,
                &self.config.duplicate_name_suffix,
                &*self.clock,
            ),
            daily_limit,
        };

        let task = self
            .store
            .transact(move |tx| -> TaskBoardResult<Task> {
                let boards = lock_boards(tx, pending.stakeholders.iter())?;
                insert_with_fanout(tx, &pending, boards, SeedPolicy::FirstFree)?;
                Ok(pending.task)
            })
            .await?;
        info!(task_id = %task.id(), "task duplicated");
        Ok(task)
    }

    /// Returns a user's board with all five columns.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Store`] when the board cannot be read.
    pub async fn get_board(&self, user_id: UserId) -> TaskBoardResult<KanbanBoard> {
        self.get_board_filtered(user_id, BoardFilter::default())
            .await
    }

    /// Returns a user's board restricted to the cards `filter` accepts.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Store`] when the board cannot be read.
    pub async fn get_board_filtered(
        &self,
        user_id: UserId,
        filter: BoardFilter,
    ) -> TaskBoardResult<KanbanBoard> {
        let entries = self.store.board_entries(user_id).await?;
        Ok(KanbanBoard::assemble(user_id, &entries, &filter))
    }

    /// Returns a task's status history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] for an unknown task.
    pub async fn get_audit_trail(&self, task_id: TaskId) -> TaskBoardResult<Vec<StatusLogEntry>> {
        self.get_task(task_id).await?;
        let mut entries = self.store.status_log(task_id).await?;
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Returns a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] for an unknown task.
    pub async fn get_task(&self, task_id: TaskId) -> TaskBoardResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(TaskBoardError::TaskNotFound(task_id))
    }

    /// Replaces a task's deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] for an unknown task and
    /// [`TaskBoardError::Domain`] when the deadline precedes the start.
    #[tracing::instrument(skip(self))]
    pub async fn update_deadline(
        &self,
        task_id: TaskId,
        deadline: DateTime<Utc>,
    ) -> TaskBoardResult<Task> {
        let clock = Arc::clone(&self.clock);
        let task = self
            .store
            .transact(move |tx| -> TaskBoardResult<Task> {
                let mut task = tx
                    .lock_task(task_id)?
                    .ok_or(TaskBoardError::TaskNotFound(task_id))?;
                task.reschedule(deadline, &*clock)?;
                tx.update_task(&task)?;
                Ok(task)
            })
            .await?;
        info!(%task_id, %deadline, "task deadline updated");
        Ok(task)
    }

    /// Edits a task's descriptive fields. Status is never changed here.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] for an unknown task.
    #[tracing::instrument(skip(self, edit))]
    pub async fn edit_task(&self, task_id: TaskId, edit: TaskEdit) -> TaskBoardResult<Task> {
        let clock = Arc::clone(&self.clock);
        let task = self
            .store
            .transact(move |tx| -> TaskBoardResult<Task> {
                let mut task = tx
                    .lock_task(task_id)?
                    .ok_or(TaskBoardError::TaskNotFound(task_id))?;
                if edit.is_empty() {
                    return Ok(task);
                }
                task.apply_edit(edit, &*clock);
                tx.update_task(&task)?;
                Ok(task)
            })
            .await?;
        debug!(%task_id, "task edited");
        Ok(task)
    }

    async fn privileged_users(&self) -> TaskBoardResult<Vec<UserId>> {
        Ok(self
            .directory
            .privileged_users(&self.privileged.to_vec())
            .await?)
    }

    /// Returns the daily limit in force for a known user, or `None` when the
    /// directory has no such user.
    async fn daily_limit_of(&self, user_id: UserId) -> TaskBoardResult<Option<u32>> {
        if self.directory.find_user(user_id).await?.is_none() {
            return Ok(None);
        }
        let limit = self.directory.task_limit(user_id).await?;
        Ok(Some(limit.unwrap_or(self.config.default_daily_task_limit)))
    }

    async fn actor_name(&self, user_id: UserId) -> TaskBoardResult<String> {
        Ok(self
            .directory
            .find_user(user_id)
            .await?
            .map_or_else(|| UNKNOWN_ACTOR_NAME.to_owned(), |profile| profile.display_name))
    }
}

fn has_capacity(tx: &mut dyn BoardTransaction, pending: &PendingTask) -> TaskBoardResult<bool> {
    let open = tx.count_open_tasks_on(
        pending.task.assignee_id(),
        pending.task.schedule().start_day(),
    )?;
    Ok(open < pending.daily_limit)
}

fn limit_exceeded(pending: &PendingTask) -> TaskBoardError {
    TaskBoardError::LimitExceeded {
        user_id: pending.task.assignee_id(),
        day: pending.task.schedule().start_day(),
        limit: pending.daily_limit,
    }
}

/// Locks the given boards in ascending user order and loads them.
///
/// The assignee's board lock also serialises the daily limit check, so it
/// must be held before counting.
fn lock_boards(
    tx: &mut dyn BoardTransaction,
    users: impl IntoIterator<Item = UserId>,
) -> TaskBoardResult<Vec<UserBoard>> {
    let ordered: BTreeSet<UserId> = users.into_iter().collect();
    ordered
        .into_iter()
        .map(|user_id| tx.lock_board(user_id).map_err(TaskBoardError::from))
        .collect()
}

/// Inserts the task and seeds a `Todo` card on every locked stakeholder
/// board.
fn insert_with_fanout(
    tx: &mut dyn BoardTransaction,
    pending: &PendingTask,
    boards: Vec<UserBoard>,
    policy: SeedPolicy,
) -> TaskBoardResult<Vec<Placement>> {
    tx.insert_task(&pending.task)?;
    let mut ledger = PositionLedger::new(boards);
    let seeded = ledger.seed(pending.task.id(), TaskStatus::Todo, policy)?;
    for board in ledger.boards() {
        tx.save_board(board)?;
    }
    Ok(seeded)
}

/// Runs a batch inside one unit.
///
/// Every stakeholder board of the batch is locked up front in ascending
/// order, so concurrent batches and single creates cannot deadlock and no
/// entry is counted before its assignee's board is held.
fn create_batch(
    tx: &mut dyn BoardTransaction,
    entries: Vec<BatchEntry>,
) -> TaskBoardResult<BatchCreateOutcome> {
    let everyone = entries
        .iter()
        .filter_map(|entry| match entry {
            BatchEntry::Pending { pending, .. } => Some(pending.stakeholders.iter()),
            BatchEntry::Unknown { .. } => None,
        })
        .flatten()
        .collect::<Vec<_>>();
    lock_boards(tx, everyone)?;

    let mut outcome = BatchCreateOutcome::default();
    for entry in entries {
        match entry {
            BatchEntry::Unknown { index, assignee_id } => outcome.skipped.push(SkippedTask {
                index,
                assignee_id,
                reason: SkipReason::UnknownAssignee,
            }),
            BatchEntry::Pending { index, pending } => {
                if !has_capacity(tx, &pending)? {
                    outcome.skipped.push(SkippedTask {
                        index,
                        assignee_id: pending.task.assignee_id(),
                        reason: SkipReason::LimitExceeded,
                    });
                    continue;
                }
                let boards = lock_boards(tx, pending.stakeholders.iter())?;
                insert_with_fanout(tx, &pending, boards, SeedPolicy::Append)?;
                outcome.created.push(pending.task);
            }
        }
    }
    Ok(outcome)
}
