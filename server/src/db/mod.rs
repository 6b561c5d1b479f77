use chrono::Utc;
use rocket::fairing::{self, AdHoc};
use rocket::{Build, Rocket};
use rocket_db_pools::Database;
use sqlx::sqlite::SqlitePool;

use crate::error::StoreError;

pub mod types;

use types::{
    ChallengeRecord, LeaderboardRecord, NewChallenge, ToggleOutcome, UserChallengeRecord,
    UserRecord,
};

#[derive(Database, Clone, Debug)]
#[database("challenge_arena")]
pub struct DB(SqlitePool);

type Result<T> = std::result::Result<T, StoreError>;

impl DB {
    pub async fn get_challenge(&self, id: &str) -> Result<Option<ChallengeRecord>> {
        Ok(
            sqlx::query_as::<_, ChallengeRecord>("SELECT * FROM challenges WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.0)
                .await?,
        )
    }

    pub async fn list_challenges(&self, global_only: bool) -> Result<Vec<ChallengeRecord>> {
        let query = if global_only {
            "SELECT * FROM challenges WHERE is_global = TRUE ORDER BY created_at, id"
        } else {
            "SELECT * FROM challenges ORDER BY created_at, id"
        };
        Ok(sqlx::query_as::<_, ChallengeRecord>(query)
            .fetch_all(&self.0)
            .await?)
    }

    pub async fn create_challenge(&self, challenge: &NewChallenge) -> Result<ChallengeRecord> {
        Ok(sqlx::query_as::<_, ChallengeRecord>(
            r#"
            INSERT INTO challenges (id, title, description, difficulty, stars, deadline, created_by, is_ai, is_global)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&challenge.id)
        .bind(&challenge.title)
        .bind(&challenge.description)
        .bind(&challenge.difficulty)
        .bind(challenge.stars)
        .bind(challenge.deadline)
        .bind(&challenge.created_by)
        .bind(challenge.is_ai)
        .bind(challenge.is_global)
        .fetch_one(&self.0)
        .await?)
    }

    /// Removes a challenge and its assignment rows in one transaction. User
    /// aggregates accumulated from this challenge are deliberately left
    /// untouched.
    pub async fn delete_challenge(&self, id: &str) -> Result<()> {
        let mut tx = self.0.begin().await?;

        let existing = sqlx::query("SELECT id FROM challenges WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(StoreError::ChallengeNotFound);
        }

        sqlx::query("DELETE FROM user_challenges WHERE challenge_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM challenges WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(
            sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.0)
                .await?,
        )
    }

    /// Idempotent creation: an existing row wins over the submitted name.
    pub async fn get_or_create_user(&self, id: &str, name: &str) -> Result<UserRecord> {
        if let Some(existing) = self.get_user(id).await? {
            return Ok(existing);
        }

        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, name)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn rename_user(&self, id: &str, name: Option<&str>) -> Result<UserRecord> {
        let user = self.get_user(id).await?.ok_or(StoreError::UserNotFound)?;

        let Some(name) = name else {
            return Ok(user);
        };

        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET name = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn list_user_challenges(&self, user_id: &str) -> Result<Vec<UserChallengeRecord>> {
        Ok(sqlx::query_as::<_, UserChallengeRecord>(
            "SELECT * FROM user_challenges WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.0)
        .await?)
    }

    /// Creates the assignment row and, for global challenges, bumps the
    /// participant counter, committed together.
    pub async fn assign_challenge(&self, challenge_id: &str, user_id: &str) -> Result<i64> {
        let mut tx = self.0.begin().await?;

        let challenge =
            sqlx::query_as::<_, ChallengeRecord>("SELECT * FROM challenges WHERE id = ?")
                .bind(challenge_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::ChallengeNotFound)?;

        let user = sqlx::query("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(StoreError::UserNotFound);
        }

        let existing =
            sqlx::query("SELECT id FROM user_challenges WHERE user_id = ? AND challenge_id = ?")
                .bind(user_id)
                .bind(challenge_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(StoreError::AlreadyAssigned);
        }

        let record: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO user_challenges (user_id, challenge_id, completed)
            VALUES (?, ?, FALSE)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(challenge_id)
        .fetch_one(&mut *tx)
        .await?;

        if challenge.is_global {
            sqlx::query("UPDATE challenges SET participants_count = participants_count + 1 WHERE id = ?")
                .bind(challenge_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(record.0)
    }

    /// Flips completion for one (user, challenge) pair. The join row, the
    /// user aggregates and the global counters move in a single transaction;
    /// decrements are floored at zero.
    pub async fn toggle_completion(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<ToggleOutcome> {
        let mut tx = self.0.begin().await?;

        let assignment = sqlx::query_as::<_, UserChallengeRecord>(
            "SELECT * FROM user_challenges WHERE user_id = ? AND challenge_id = ?",
        )
        .bind(user_id)
        .bind(challenge_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::AssignmentNotFound)?;

        let challenge =
            sqlx::query_as::<_, ChallengeRecord>("SELECT * FROM challenges WHERE id = ?")
                .bind(challenge_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::ChallengeNotFound)?;

        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        let completed = !assignment.completed;
        let completed_at = completed.then(|| Utc::now().naive_utc());

        sqlx::query("UPDATE user_challenges SET completed = ?, completed_at = ? WHERE id = ?")
            .bind(completed)
            .bind(completed_at)
            .bind(assignment.id)
            .execute(&mut *tx)
            .await?;

        let (completed_challenges, total_stars) = if completed {
            (
                user.completed_challenges + 1,
                user.total_stars + challenge.stars,
            )
        } else {
            (
                (user.completed_challenges - 1).max(0),
                (user.total_stars - challenge.stars).max(0),
            )
        };
        let can_publish = completed_challenges >= 5;

        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET completed_challenges = ?, total_stars = ?, can_publish = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(completed_challenges)
        .bind(total_stars)
        .bind(can_publish)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if challenge.is_global {
            let delta: i64 = if completed { 1 } else { -1 };
            sqlx::query(
                "UPDATE challenges SET completed_count = MAX(0, completed_count + ?) WHERE id = ?",
            )
            .bind(delta)
            .bind(challenge_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ToggleOutcome { completed, user })
    }

    /// Users with at least one completion first, ordered by completion count
    /// descending, then every remaining user in arrival order with a zero
    /// count.
    pub async fn get_leaderboard(&self) -> Result<Vec<LeaderboardRecord>> {
        let mut records =
            sqlx::query_as::<_, LeaderboardRecord>(include_str!("../../sql/get_leaderboard.sql"))
                .fetch_all(&self.0)
                .await?;

        let everyone: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM users ORDER BY created_at, id")
                .fetch_all(&self.0)
                .await?;

        for (id, name) in everyone {
            if records.iter().any(|record| record.id == id) {
                continue;
            }
            records.push(LeaderboardRecord {
                id,
                name,
                completed_count: 0,
            });
        }

        Ok(records)
    }

    /// Inserts the five predefined global challenges unless any global
    /// challenge already exists.
    pub async fn seed_global_challenges(&self) -> Result<()> {
        let existing = sqlx::query("SELECT id FROM challenges WHERE is_global = TRUE LIMIT 1")
            .fetch_optional(&self.0)
            .await?;
        if existing.is_some() {
            rocket::info!("Global challenges already present, skipping seed");
            return Ok(());
        }

        let now = Utc::now().naive_utc();
        let seeds: [(&str, &str, &str, &str, i64, i64, i64, i64); 5] = [
            (
                "g1",
                "30-Day Fitness Challenge",
                "Exercise for at least 30 minutes every day for a month",
                "hard",
                10,
                30,
                1247,
                523,
            ),
            (
                "g2",
                "Read 5 Books This Month",
                "Finish reading 5 books of any genre by end of month",
                "medium",
                7,
                20,
                892,
                234,
            ),
            (
                "g3",
                "Zero Waste Week",
                "Produce no waste for 7 consecutive days",
                "extreme",
                15,
                10,
                456,
                89,
            ),
            (
                "g4",
                "Learn a New Language",
                "Study a new language for 20 minutes daily for 2 weeks",
                "medium",
                6,
                14,
                2103,
                876,
            ),
            (
                "g5",
                "Cold Shower Challenge",
                "Take cold showers every day for a week",
                "easy",
                4,
                7,
                3421,
                1876,
            ),
        ];

        let mut tx = self.0.begin().await?;
        for (id, title, description, difficulty, stars, deadline_days, participants, completed) in
            seeds
        {
            sqlx::query(
                r#"
                INSERT INTO challenges (id, title, description, difficulty, stars, deadline, is_global, participants_count, completed_count)
                VALUES (?, ?, ?, ?, ?, ?, TRUE, ?, ?)
                "#,
            )
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(difficulty)
            .bind(stars)
            .bind(now + chrono::Duration::days(deadline_days))
            .bind(participants)
            .bind(completed)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        rocket::info!("Seeded {} global challenges", seeds.len());
        Ok(())
    }
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                rocket::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

async fn seed(rocket: Rocket<Build>) -> Rocket<Build> {
    if let Some(db) = DB::fetch(&rocket) {
        // A failed seed leaves an empty but usable catalog.
        if let Err(e) = db.seed_global_challenges().await {
            rocket::warn!("Failed to seed global challenges: {e}");
        }
    }
    rocket
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket
            .attach(DB::init())
            .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
            .attach(AdHoc::on_ignite("Seed global challenges", seed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_db() -> DB {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        DB(pool)
    }

    fn deadline() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn new_challenge(id: &str, stars: i64, is_global: bool) -> NewChallenge {
        NewChallenge {
            id: id.to_string(),
            title: format!("Challenge {id}"),
            description: "Do the thing".to_string(),
            difficulty: "medium".to_string(),
            stars,
            deadline: deadline(),
            created_by: None,
            is_ai: false,
            is_global,
        }
    }

    #[rocket::async_test]
    async fn get_or_create_is_idempotent() {
        let db = test_db().await;
        let first = db.get_or_create_user("u1", "Alice").await.unwrap();
        let second = db.get_or_create_user("u1", "Bob").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Alice");
        assert_eq!(second.completed_challenges, 0);
        assert!(!second.can_publish);
    }

    #[rocket::async_test]
    async fn duplicate_assignment_conflicts() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.create_challenge(&new_challenge("c1", 5, false))
            .await
            .unwrap();

        db.assign_challenge("c1", "u1").await.unwrap();
        let err = db.assign_challenge("c1", "u1").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyAssigned));

        let assignments = db.list_user_challenges("u1").await.unwrap();
        assert_eq!(assignments.len(), 1);
    }

    #[rocket::async_test]
    async fn assigning_missing_challenge_fails() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        let err = db.assign_challenge("nope", "u1").await.unwrap_err();
        assert!(matches!(err, StoreError::ChallengeNotFound));
    }

    #[rocket::async_test]
    async fn toggle_twice_restores_stats() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.create_challenge(&new_challenge("g1", 10, true))
            .await
            .unwrap();
        db.assign_challenge("g1", "u1").await.unwrap();

        let on = db.toggle_completion("g1", "u1").await.unwrap();
        assert!(on.completed);
        assert_eq!(on.user.completed_challenges, 1);
        assert_eq!(on.user.total_stars, 10);

        let challenge = db.get_challenge("g1").await.unwrap().unwrap();
        assert_eq!(challenge.participants_count, 1);
        assert_eq!(challenge.completed_count, 1);

        let assignment = &db.list_user_challenges("u1").await.unwrap()[0];
        assert!(assignment.completed_at.is_some());

        let off = db.toggle_completion("g1", "u1").await.unwrap();
        assert!(!off.completed);
        assert_eq!(off.user.completed_challenges, 0);
        assert_eq!(off.user.total_stars, 0);

        let challenge = db.get_challenge("g1").await.unwrap().unwrap();
        assert_eq!(challenge.completed_count, 0);
        assert_eq!(challenge.participants_count, 1);

        let assignment = &db.list_user_challenges("u1").await.unwrap()[0];
        assert!(assignment.completed_at.is_none());
    }

    #[rocket::async_test]
    async fn toggle_without_assignment_fails() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.create_challenge(&new_challenge("c1", 5, false))
            .await
            .unwrap();
        let err = db.toggle_completion("c1", "u1").await.unwrap_err();
        assert!(matches!(err, StoreError::AssignmentNotFound));
    }

    #[rocket::async_test]
    async fn aggregates_floor_at_zero() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.create_challenge(&new_challenge("c1", 5, false))
            .await
            .unwrap();
        db.assign_challenge("c1", "u1").await.unwrap();
        db.toggle_completion("c1", "u1").await.unwrap();

        // Simulate drift so the decrement would go negative.
        sqlx::query("UPDATE users SET completed_challenges = 0, total_stars = 0 WHERE id = 'u1'")
            .execute(&db.0)
            .await
            .unwrap();

        let off = db.toggle_completion("c1", "u1").await.unwrap();
        assert!(!off.completed);
        assert_eq!(off.user.completed_challenges, 0);
        assert_eq!(off.user.total_stars, 0);
    }

    #[rocket::async_test]
    async fn can_publish_requires_five_completions() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        for i in 0..5 {
            let id = format!("c{i}");
            db.create_challenge(&new_challenge(&id, 1, false))
                .await
                .unwrap();
            db.assign_challenge(&id, "u1").await.unwrap();
            let outcome = db.toggle_completion(&id, "u1").await.unwrap();
            let expected = i == 4;
            assert_eq!(outcome.user.can_publish, expected, "after {} toggles", i + 1);
        }

        let outcome = db.toggle_completion("c0", "u1").await.unwrap();
        assert_eq!(outcome.user.completed_challenges, 4);
        assert!(!outcome.user.can_publish);
    }

    #[rocket::async_test]
    async fn delete_cascades_to_assignments() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.create_challenge(&new_challenge("c1", 5, false))
            .await
            .unwrap();
        db.assign_challenge("c1", "u1").await.unwrap();

        db.delete_challenge("c1").await.unwrap();
        assert!(db.get_challenge("c1").await.unwrap().is_none());
        assert!(db.list_user_challenges("u1").await.unwrap().is_empty());

        let err = db.assign_challenge("c1", "u1").await.unwrap_err();
        assert!(matches!(err, StoreError::ChallengeNotFound));

        let err = db.delete_challenge("c1").await.unwrap_err();
        assert!(matches!(err, StoreError::ChallengeNotFound));
    }

    #[rocket::async_test]
    async fn delete_keeps_user_aggregates() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.create_challenge(&new_challenge("c1", 5, false))
            .await
            .unwrap();
        db.assign_challenge("c1", "u1").await.unwrap();
        db.toggle_completion("c1", "u1").await.unwrap();

        db.delete_challenge("c1").await.unwrap();

        let user = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.completed_challenges, 1);
        assert_eq!(user.total_stars, 5);
    }

    #[rocket::async_test]
    async fn leaderboard_orders_and_appends_newcomers() {
        let db = test_db().await;
        db.get_or_create_user("u1", "Alice").await.unwrap();
        db.get_or_create_user("u2", "Bob").await.unwrap();
        db.get_or_create_user("u3", "Carol").await.unwrap();

        for id in ["c1", "c2"] {
            db.create_challenge(&new_challenge(id, 1, false))
                .await
                .unwrap();
        }
        for id in ["c1", "c2"] {
            db.assign_challenge(id, "u2").await.unwrap();
            db.toggle_completion(id, "u2").await.unwrap();
        }
        db.assign_challenge("c1", "u1").await.unwrap();
        db.toggle_completion("c1", "u1").await.unwrap();

        let records = db.get_leaderboard().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "u2");
        assert_eq!(records[0].completed_count, 2);
        assert_eq!(records[1].id, "u1");
        assert_eq!(records[1].completed_count, 1);
        assert_eq!(records[2].id, "u3");
        assert_eq!(records[2].completed_count, 0);
    }

    #[rocket::async_test]
    async fn seed_runs_once() {
        let db = test_db().await;
        db.seed_global_challenges().await.unwrap();
        db.seed_global_challenges().await.unwrap();

        let globals = db.list_challenges(true).await.unwrap();
        assert_eq!(globals.len(), 5);
        let g1 = db.get_challenge("g1").await.unwrap().unwrap();
        assert_eq!(g1.difficulty, "hard");
        assert_eq!(g1.stars, 10);
        assert_eq!(g1.participants_count, 1247);
    }
}
