pub mod models;
pub mod schema;

use chorewheel_shared::auth::Role;
use chorewheel_shared::domain::{ChoreStatus, ParseEnumError, RewardKind};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{Chore, CompletedTask, NewChore, NewFamily, NewUser, Submission, User};

use crate::server::config::{FamilyConfig, UserConfig};

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// A stored value does not decode into its domain type.
    #[error("decode error: {0}")]
    Decode(#[from] ParseEnumError),
}

/// Validated inputs for a new chore definition. `reward_amount` becomes both
/// the immutable original reward and the initial current reward.
#[derive(Debug, Clone)]
pub struct ChoreDraft {
    pub title: String,
    pub description: Option<String>,
    pub reward_kind: RewardKind,
    pub reward_amount: i32,
    pub requires_photo: bool,
    pub acceptance_timer: i32,
    pub completion_timer_enabled: bool,
    pub completion_timer_duration: i32,
    pub completion_timer_penalty: i32,
    pub reduction_enabled: bool,
    pub reduction_amount: i32,
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    pub(crate) fn pool(&self) -> Pool<ConnectionManager<SqliteConnection>> {
        self.pool.clone()
    }

    /// Upserts the family and its users from the config file. Existing user
    /// rows keep their balances; identity fields follow the config. Returns
    /// the family id.
    pub async fn seed_from_config(
        &self,
        cfg_family: &FamilyConfig,
        cfg_users: &[UserConfig],
    ) -> Result<i32, StorageError> {
        use schema::{families, users};

        let pool = self.pool.clone();
        let family_owned = cfg_family.clone();
        let users_owned = cfg_users.to_owned();
        tokio::task::spawn_blocking(move || -> Result<i32, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;

            let existing: Option<i32> = families::table
                .select(families::id)
                .order(families::id.asc())
                .first::<i32>(&mut conn)
                .optional()?;
            let family_id = match existing {
                Some(fid) => {
                    diesel::update(families::table.filter(families::id.eq(fid)))
                        .set(families::name.eq(&family_owned.name))
                        .execute(&mut conn)?;
                    fid
                }
                None => diesel::insert_into(families::table)
                    .values(&NewFamily {
                        name: &family_owned.name,
                    })
                    .returning(families::id)
                    .get_result::<i32>(&mut conn)?,
            };

            for u in &users_owned {
                let new_user = NewUser {
                    family_id,
                    username: &u.username,
                    display_name: &u.display_name,
                    password_hash: &u.password_hash,
                    role: u.role.as_str(),
                    is_active: true,
                };
                diesel::insert_into(users::table)
                    .values(&new_user)
                    .on_conflict(users::username)
                    .do_update()
                    .set((
                        users::family_id.eq(family_id),
                        users::display_name.eq(&u.display_name),
                        users::password_hash.eq(&u.password_hash),
                        users::role.eq(u.role.as_str()),
                        users::is_active.eq(true),
                    ))
                    .execute(&mut conn)?;
            }

            Ok(family_id)
        })
        .await?
    }

    pub async fn get_user_by_username(&self, name: &str) -> Result<Option<User>, StorageError> {
        use schema::users::dsl::*;
        let pool = self.pool.clone();
        let name_owned = name.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<User>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(users
                .filter(username.eq(&name_owned))
                .filter(is_active.eq(true))
                .first::<User>(&mut conn)
                .optional()?)
        })
        .await?
    }

    /// Active children of a family in ascending id order, the stable order
    /// the rotation policy depends on.
    pub async fn list_children(&self, family: i32) -> Result<Vec<User>, StorageError> {
        use schema::users::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<User>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(users
                .filter(family_id.eq(family))
                .filter(role.eq(Role::Child.as_str()))
                .filter(is_active.eq(true))
                .order(id.asc())
                .load::<User>(&mut conn)?)
        })
        .await?
    }

    pub async fn get_child(
        &self,
        family: i32,
        child_id: i32,
    ) -> Result<Option<User>, StorageError> {
        use schema::users::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<User>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(users
                .filter(id.eq(child_id))
                .filter(family_id.eq(family))
                .filter(role.eq(Role::Child.as_str()))
                .filter(is_active.eq(true))
                .first::<User>(&mut conn)
                .optional()?)
        })
        .await?
    }

    pub async fn create_chore(
        &self,
        family: i32,
        creator: i32,
        draft: ChoreDraft,
    ) -> Result<Chore, StorageError> {
        use schema::chores;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Chore, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let new_chore = NewChore {
                family_id: family,
                title: &draft.title,
                description: draft.description.as_deref(),
                reward_kind: draft.reward_kind.as_str(),
                original_reward: draft.reward_amount,
                current_reward: draft.reward_amount,
                requires_photo: draft.requires_photo,
                status: ChoreStatus::Available.as_str(),
                acceptance_timer: draft.acceptance_timer,
                completion_timer_enabled: draft.completion_timer_enabled,
                completion_timer_duration: draft.completion_timer_duration,
                completion_timer_penalty: draft.completion_timer_penalty,
                reduction_enabled: draft.reduction_enabled,
                reduction_amount: draft.reduction_amount,
                created_by: creator,
            };
            Ok(diesel::insert_into(chores::table)
                .values(&new_chore)
                .get_result::<Chore>(&mut conn)?)
        })
        .await?
    }

    pub async fn list_chores(
        &self,
        family: i32,
        status_filter: Option<ChoreStatus>,
        assignee_filter: Option<i32>,
    ) -> Result<Vec<Chore>, StorageError> {
        use schema::chores::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Chore>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let mut query = chores.filter(family_id.eq(family)).into_boxed();
            if let Some(s) = status_filter {
                query = query.filter(status.eq(s.as_str()));
            }
            if let Some(a) = assignee_filter {
                query = query.filter(current_assignee.eq(a));
            }
            Ok(query.order(created_at.desc()).load::<Chore>(&mut conn)?)
        })
        .await?
    }

    pub async fn get_chore(&self, family: i32, chore: i32) -> Result<Option<Chore>, StorageError> {
        use schema::chores::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<Chore>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(chores
                .filter(id.eq(chore))
                .filter(family_id.eq(family))
                .first::<Chore>(&mut conn)
                .optional()?)
        })
        .await?
    }

    pub async fn list_submissions_for_chore(
        &self,
        chore: i32,
    ) -> Result<Vec<Submission>, StorageError> {
        use schema::chore_submissions::dsl as cs;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Submission>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(cs::chore_submissions
                .filter(cs::chore_id.eq(chore))
                .order(cs::submitted_at.desc())
                .load::<Submission>(&mut conn)?)
        })
        .await?
    }

    pub async fn list_completions_for_chore(
        &self,
        chore: i32,
    ) -> Result<Vec<CompletedTask>, StorageError> {
        use schema::completed_tasks::dsl as ct;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<CompletedTask>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(ct::completed_tasks
                .filter(ct::chore_id.eq(chore))
                .order(ct::completed_at.desc())
                .load::<CompletedTask>(&mut conn)?)
        })
        .await?
    }

    pub async fn list_completions_for_user(
        &self,
        user: i32,
    ) -> Result<Vec<CompletedTask>, StorageError> {
        use schema::completed_tasks::dsl as ct;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<CompletedTask>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(ct::completed_tasks
                .filter(ct::user_id.eq(user))
                .order(ct::completed_at.desc())
                .load::<CompletedTask>(&mut conn)?)
        })
        .await?
    }
}

pub(crate) fn configure_sqlite_conn(
    conn: &mut SqliteConnection,
) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    // Ignore the result rows; Diesel's execute is fine for PRAGMAs
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    Ok(())
}
