//! Plan repository: study plans grouping a user's goals

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::goal::{row_to_goal, Goal, GOAL_COLUMNS};
use super::DbPool;
use crate::{Error, Result};

/// A study plan with its linked goals
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: i64,
    pub user_id: i64,
    pub goals: Vec<Goal>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new plan
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub user_id: i64,
    pub goal_ids: Vec<i64>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
}

/// Plan repository
#[derive(Clone)]
pub struct PlanRepo {
    pool: DbPool,
}

impl PlanRepo {
    /// Create a new plan repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a plan linking goals owned by the user
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user does not exist,
    /// `Error::InvalidRequest` if no goals are given or any goal belongs to
    /// someone else, or a database error
    pub fn create(&self, plan: &NewPlan) -> Result<Plan> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let tx = conn.transaction()?;

        let user: Option<i64> = tx
            .query_row("SELECT id FROM users WHERE id = ?1", [plan.user_id], |row| {
                row.get(0)
            })
            .optional()?;
        if user.is_none() {
            return Err(Error::NotFound("User not found".to_string()));
        }

        if plan.goal_ids.is_empty() {
            return Err(Error::InvalidRequest("No goals provided".to_string()));
        }

        let mut goal_ids = plan.goal_ids.clone();
        goal_ids.sort_unstable();
        goal_ids.dedup();

        {
            let mut owned = tx.prepare("SELECT 1 FROM goals WHERE id = ?1 AND user_id = ?2")?;
            for goal_id in &goal_ids {
                if !owned.exists([*goal_id, plan.user_id])? {
                    return Err(Error::InvalidRequest("Invalid goal for user".to_string()));
                }
            }
        }

        let now = Utc::now();

        tx.execute(
            "INSERT INTO plans (user_id, due_date, recurrence, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![plan.user_id, plan.due_date, plan.recurrence, now.to_rfc3339()],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut link = tx.prepare("INSERT INTO plan_goals (plan_id, goal_id) VALUES (?1, ?2)")?;
            for goal_id in &goal_ids {
                link.execute([id, *goal_id])?;
            }
        }

        let goals = load_goals(&tx, id)?;
        tx.commit()?;

        Ok(Plan {
            id,
            user_id: plan.user_id,
            goals,
            due_date: plan.due_date.clone(),
            recurrence: plan.recurrence.clone(),
            created_at: now,
        })
    }

    /// Get a plan with its goals
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, id: i64) -> Result<Option<Plan>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        load_plan(&conn, id)
    }

    /// List a user's plans, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<Plan>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT id FROM plans WHERE user_id = ?1 ORDER BY created_at, id")?;
        let ids: Vec<i64> = stmt
            .query_map([user_id], |row| row.get(0))?
            .filter_map(std::result::Result::ok)
            .collect();

        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(plan) = load_plan(&conn, id)? {
                plans.push(plan);
            }
        }

        Ok(plans)
    }

    /// Delete a plan and its goal links
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the plan does not exist, or a database error
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        // plan_goals rows go with it via ON DELETE CASCADE
        let deleted = conn.execute("DELETE FROM plans WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("Plan not found".to_string()));
        }

        Ok(())
    }
}

fn load_plan(conn: &rusqlite::Connection, id: i64) -> Result<Option<Plan>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, due_date, recurrence, created_at FROM plans WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, user_id, due_date, recurrence, created_at)) = row else {
        return Ok(None);
    };

    Ok(Some(Plan {
        id,
        user_id,
        goals: load_goals(conn, id)?,
        due_date,
        recurrence,
        created_at: parse_datetime(&created_at),
    }))
}

fn load_goals(conn: &rusqlite::Connection, plan_id: i64) -> Result<Vec<Goal>> {
    let columns = GOAL_COLUMNS
        .split(", ")
        .map(|c| format!("g.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM goals g
         JOIN plan_goals pg ON g.id = pg.goal_id
         WHERE pg.plan_id = ?1 ORDER BY g.id"
    ))?;

    let goals = stmt
        .query_map([plan_id], row_to_goal)?
        .filter_map(std::result::Result::ok)
        .collect();

    Ok(goals)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, GoalRepo, NewGoal, Role, UserRepo};

    struct Fixture {
        plans: PlanRepo,
        users: UserRepo,
        goals: GoalRepo,
    }

    fn setup() -> Fixture {
        let pool = init_memory().unwrap();
        Fixture {
            plans: PlanRepo::new(pool.clone()),
            users: UserRepo::new(pool.clone()),
            goals: GoalRepo::new(pool),
        }
    }

    fn goal_for(fixture: &Fixture, user_id: i64) -> i64 {
        fixture
            .goals
            .create(&NewGoal {
                user_id,
                topic_id: 2,
                description: Some("Practice".to_string()),
                target_sessions: 4,
                due_date: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_create_get_and_list() {
        let fx = setup();
        let user = fx.users.create("planner", "h", Role::Student).unwrap();
        let a = goal_for(&fx, user.id);
        let b = goal_for(&fx, user.id);

        let plan = fx
            .plans
            .create(&NewPlan {
                user_id: user.id,
                goal_ids: vec![b, a],
                due_date: Some("2025-09-01".to_string()),
                recurrence: Some("weekly".to_string()),
            })
            .unwrap();
        assert_eq!(plan.goals.len(), 2);

        let fetched = fx.plans.get(plan.id).unwrap().unwrap();
        assert_eq!(fetched.recurrence.as_deref(), Some("weekly"));
        assert_eq!(fetched.goals[0].id, a.min(b));

        assert_eq!(fx.plans.list_for_user(user.id).unwrap().len(), 1);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let fx = setup();
        let owner = fx.users.create("owner", "h", Role::Student).unwrap();
        let other = fx.users.create("other", "h", Role::Student).unwrap();
        let foreign = goal_for(&fx, other.id);

        let err = fx
            .plans
            .create(&NewPlan {
                user_id: owner.id,
                goal_ids: vec![],
                due_date: None,
                recurrence: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(ref m) if m == "No goals provided"));

        let err = fx
            .plans
            .create(&NewPlan {
                user_id: owner.id,
                goal_ids: vec![foreign],
                due_date: None,
                recurrence: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(ref m) if m == "Invalid goal for user"));

        let err = fx
            .plans
            .create(&NewPlan {
                user_id: 404,
                goal_ids: vec![foreign],
                due_date: None,
                recurrence: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_delete_removes_plan() {
        let fx = setup();
        let user = fx.users.create("deleter", "h", Role::Student).unwrap();
        let goal = goal_for(&fx, user.id);
        let plan = fx
            .plans
            .create(&NewPlan {
                user_id: user.id,
                goal_ids: vec![goal],
                due_date: None,
                recurrence: None,
            })
            .unwrap();

        fx.plans.delete(plan.id).unwrap();
        assert!(fx.plans.get(plan.id).unwrap().is_none());
        assert!(matches!(fx.plans.delete(plan.id).unwrap_err(), Error::NotFound(_)));
        assert!(fx.goals.find(goal).unwrap().is_some());
    }
}
