use mindcraft_core::{
    Account, AccountId, AccountStore, AppContext, Argon2Hasher, BootstrapError, BootstrapOutcome,
    BootstrapService, CredentialError, CredentialHasher, DbLocation, Decoration, Inventory,
    NewAccount, Progress, RepoResult, SqliteAccountStore, ADMIN_DEFAULT_PASSWORD, ADMIN_EMAIL,
    ADMIN_USERNAME,
};
use rusqlite::Connection;
use std::cell::Cell;
use std::collections::BTreeMap;

fn service() -> BootstrapService<Argon2Hasher> {
    BootstrapService::new(Argon2Hasher::new())
}

#[test]
fn first_run_on_empty_store_creates_linked_triple() {
    let mut ctx = AppContext::enter(DbLocation::Memory).unwrap();

    let outcome = service().initialize(&mut ctx).unwrap();

    let account_id = match &outcome {
        BootstrapOutcome::Created {
            account_id,
            username,
            default_password,
        } => {
            assert_eq!(username, ADMIN_USERNAME);
            assert_eq!(*default_password, ADMIN_DEFAULT_PASSWORD);
            *account_id
        }
        other => panic!("expected created outcome, got {other:?}"),
    };
    assert!(outcome.notice().contains("Username: admin"));

    let conn = ctx.connection();
    assert_eq!(row_count(conn, "accounts"), 1);
    assert_eq!(row_count(conn, "player_progress"), 1);
    assert_eq!(row_count(conn, "player_inventory"), 1);

    let store = SqliteAccountStore::try_new(conn).unwrap();
    let admin = store.find_account_by_username("admin").unwrap().unwrap();
    assert_eq!(admin.id, account_id);
    assert_eq!(admin.email, ADMIN_EMAIL);
    assert_eq!(store.get_progress(account_id).unwrap().unwrap().account_id, account_id);
    assert_eq!(store.get_inventory(account_id).unwrap().unwrap().account_id, account_id);
}

#[test]
fn fresh_admin_has_starter_values() {
    let mut ctx = AppContext::enter(DbLocation::Memory).unwrap();
    let account_id = service().initialize(&mut ctx).unwrap().account_id();
    let store = SqliteAccountStore::try_new(ctx.connection()).unwrap();

    let progress = store.get_progress(account_id).unwrap().unwrap();
    assert_eq!(
        progress,
        Progress {
            account_id,
            level: 1,
            xp: 0,
            coins: 100,
            current_stage: 1,
            unlocked_areas: vec![1],
        }
    );

    let inventory = store.get_inventory(account_id).unwrap().unwrap();
    let items: BTreeMap<String, u32> = [("wood", 10), ("stone", 5), ("diamond", 1)]
        .into_iter()
        .map(|(name, quantity)| (name.to_string(), quantity))
        .collect();
    assert_eq!(inventory.items, items);
    assert_eq!(
        inventory.home_decorations,
        vec![
            Decoration::new("🏆", "Trophy"),
            Decoration::new("⭐", "Star"),
            Decoration::new("🎨", "Painting"),
        ]
    );
    assert!(inventory.character_cards.is_empty());
    assert!(inventory.unlocked_characters.is_empty());
}

#[test]
fn persisted_json_matches_client_encoding() {
    let mut ctx = AppContext::enter(DbLocation::Memory).unwrap();
    service().initialize(&mut ctx).unwrap();

    let (unlocked_areas, items, cards, characters): (String, String, String, String) = ctx
        .connection()
        .query_row(
            "SELECT p.unlocked_areas, i.items, i.character_cards, i.unlocked_characters
             FROM player_progress p
             JOIN player_inventory i ON i.account_id = p.account_id;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();

    assert_eq!(unlocked_areas, "[1]");
    assert_eq!(items, r#"{"diamond":1,"stone":5,"wood":10}"#);
    assert_eq!(cards, "{}");
    assert_eq!(characters, "[]");
}

#[test]
fn stored_credential_is_hashed_and_verifies() {
    let hasher = Argon2Hasher::new();
    let mut ctx = AppContext::enter(DbLocation::Memory).unwrap();
    service().initialize(&mut ctx).unwrap();

    let store = SqliteAccountStore::try_new(ctx.connection()).unwrap();
    let admin = store.find_account_by_username("admin").unwrap().unwrap();

    assert_ne!(admin.password_hash, "admin123");
    assert!(hasher.verify("admin123", &admin.password_hash).unwrap());
    assert!(!hasher.verify("admin", &admin.password_hash).unwrap());
}

#[test]
fn running_twice_leaves_exactly_one_admin() {
    let dir = tempfile::tempdir().unwrap();
    let location = DbLocation::File(dir.path().join("mindcraft.db"));
    let service = service();

    service.run(location.clone()).unwrap();
    service.run(location.clone()).unwrap();

    let conn = Connection::open(dir.path().join("mindcraft.db")).unwrap();
    assert_eq!(row_count(&conn, "accounts"), 1);
    assert_eq!(row_count(&conn, "player_progress"), 1);
    assert_eq!(row_count(&conn, "player_inventory"), 1);
    let admins: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM accounts WHERE username = 'admin';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(admins, 1);
}

#[test]
fn reset_discards_unrelated_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mindcraft.db");
    let location = DbLocation::File(path.clone());

    AppContext::scope(location.clone(), |ctx| -> Result<(), BootstrapError> {
        ctx.reset_schema()?;
        let store = SqliteAccountStore::try_new(ctx.connection())?;
        for name in ["steve", "alex", "herobrine"] {
            let id = store.create_account(&NewAccount::new(name, "p@mindcraft.com", "hash"))?;
            store.create_progress(&Progress::starter(id))?;
            store.create_inventory(&Inventory::empty(id))?;
        }
        ctx.connection().execute_batch("CREATE TABLE guilds (name TEXT);")?;
        Ok(())
    })
    .unwrap();

    service().run(location).unwrap();

    let conn = Connection::open(&path).unwrap();
    assert_eq!(row_count(&conn, "accounts"), 1);
    assert_eq!(row_count(&conn, "player_progress"), 1);
    assert_eq!(row_count(&conn, "player_inventory"), 1);
    let usernames: Vec<String> = conn
        .prepare("SELECT username FROM accounts;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(usernames, ["admin"]);
    let guilds: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'guilds';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(guilds, 0);
}

#[test]
fn reset_replaces_legacy_schema_with_conflicting_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    let legacy = Connection::open(&path).unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE user (
                id INTEGER PRIMARY KEY,
                username VARCHAR(80) UNIQUE NOT NULL,
                email VARCHAR(120) NOT NULL,
                password_hash VARCHAR(128) NOT NULL
            );
            CREATE TABLE player_progress (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                level INTEGER,
                unlocked_areas TEXT
            );
            INSERT INTO user (username, email, password_hash) VALUES ('steve', 's@x.y', 'h');
            INSERT INTO player_progress (user_id, level, unlocked_areas) VALUES (1, 7, '[1,2]');",
        )
        .unwrap();
    drop(legacy);

    let outcome = service().run(DbLocation::File(path.clone())).unwrap();
    assert!(outcome.is_created());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(table_count(&conn, "user"), 0);
    assert_eq!(row_count(&conn, "accounts"), 1);
    assert_eq!(row_count(&conn, "player_progress"), 1);
    assert_eq!(row_count(&conn, "player_inventory"), 1);
}

#[test]
fn reset_replaces_store_with_newer_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let future = Connection::open(&path).unwrap();
    future
        .execute_batch(
            "CREATE TABLE accounts (id INTEGER PRIMARY KEY, handle TEXT);
             INSERT INTO accounts (handle) VALUES ('from-the-future');
             PRAGMA user_version = 7;",
        )
        .unwrap();
    drop(future);

    let outcome = service().run(DbLocation::File(path.clone())).unwrap();
    assert!(outcome.is_created());

    let conn = Connection::open(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, mindcraft_core::db::migrations::latest_version());
    let usernames: Vec<String> = conn
        .prepare("SELECT username FROM accounts;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(usernames, ["admin"]);
}

#[test]
fn seed_skips_when_admin_already_exists() {
    let conn = mindcraft_core::db::open_db_in_memory().unwrap();
    let store = SqliteAccountStore::try_new(&conn).unwrap();
    let existing = store
        .create_account(&NewAccount::new("admin", "ops@mindcraft.com", "prior-hash"))
        .unwrap();

    let outcome = service().seed_admin(&store).unwrap();

    assert_eq!(
        outcome,
        BootstrapOutcome::AlreadyInitialized {
            account_id: existing
        }
    );
    assert_eq!(
        outcome.notice(),
        "Database already initialized. Admin user exists."
    );
    assert_eq!(store.count_accounts().unwrap(), 1);
    assert!(store.get_progress(existing).unwrap().is_none());
    assert!(store.get_inventory(existing).unwrap().is_none());
    let admin = store.find_account_by_username("admin").unwrap().unwrap();
    assert_eq!(admin.password_hash, "prior-hash");
}

#[test]
fn skip_path_performs_no_writes_or_hashing() {
    let store = RecordingStore::with_admin(9);
    let hasher = CountingHasher::default();
    let service = BootstrapService::new(&hasher);

    let outcome = service.seed_admin(&store).unwrap();

    assert_eq!(outcome, BootstrapOutcome::AlreadyInitialized { account_id: 9 });
    assert_eq!(store.writes.get(), 0);
    assert_eq!(hasher.calls.get(), 0);
}

#[test]
fn failed_dependent_insert_rolls_back_account() {
    let mut ctx = AppContext::enter(DbLocation::Memory).unwrap();
    ctx.reset_schema().unwrap();
    let service = service();
    {
        let tx = ctx.connection_mut().transaction().unwrap();
        let store = SqliteAccountStore::try_new(&tx).unwrap();
        // Account and progress inserts succeed, the inventory insert aborts.
        tx.execute_batch(
            "CREATE TRIGGER reject_inventory BEFORE INSERT ON player_inventory
             BEGIN SELECT RAISE(ABORT, 'inventory disabled'); END;",
        )
        .unwrap();
        let err = service.seed_admin(&store).unwrap_err();
        assert!(matches!(err, BootstrapError::Repo(_)));
        // Dropped without commit.
    }

    let conn = ctx.connection();
    assert_eq!(row_count(conn, "accounts"), 0);
    assert_eq!(row_count(conn, "player_progress"), 0);
    assert_eq!(row_count(conn, "player_inventory"), 0);
}

#[test]
fn hashing_failure_aborts_without_rows() {
    let mut ctx = AppContext::enter(DbLocation::Memory).unwrap();
    let service = BootstrapService::new(FailingHasher);

    let err = service.initialize(&mut ctx).unwrap_err();

    assert!(matches!(err, BootstrapError::Credential(_)));
    assert_eq!(row_count(ctx.connection(), "accounts"), 0);
}

#[test]
fn unopenable_location_is_reported_as_db_error() {
    let dir = tempfile::tempdir().unwrap();
    let location = DbLocation::File(dir.path().join("missing").join("nested").join("db.sqlite"));

    let err = service().run(location).unwrap_err();
    assert!(matches!(err, BootstrapError::Db(_)));
    assert!(err.to_string().starts_with("database error"));
}

fn table_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )
    .unwrap()
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

struct RecordingStore {
    admin: Option<Account>,
    writes: Cell<u32>,
}

impl RecordingStore {
    fn with_admin(id: AccountId) -> Self {
        Self {
            admin: Some(Account {
                id,
                username: ADMIN_USERNAME.to_string(),
                email: ADMIN_EMAIL.to_string(),
                password_hash: "hash".to_string(),
            }),
            writes: Cell::new(0),
        }
    }

    fn record_write(&self) {
        self.writes.set(self.writes.get() + 1);
    }
}

impl AccountStore for RecordingStore {
    fn find_account_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        Ok(self
            .admin
            .clone()
            .filter(|account| account.username == username))
    }

    fn create_account(&self, _account: &NewAccount) -> RepoResult<AccountId> {
        self.record_write();
        Ok(1)
    }

    fn create_progress(&self, _progress: &Progress) -> RepoResult<()> {
        self.record_write();
        Ok(())
    }

    fn create_inventory(&self, _inventory: &Inventory) -> RepoResult<()> {
        self.record_write();
        Ok(())
    }

    fn get_progress(&self, _account_id: AccountId) -> RepoResult<Option<Progress>> {
        Ok(None)
    }

    fn get_inventory(&self, _account_id: AccountId) -> RepoResult<Option<Inventory>> {
        Ok(None)
    }

    fn count_accounts(&self) -> RepoResult<u64> {
        Ok(u64::from(self.admin.is_some()))
    }
}

#[derive(Default)]
struct CountingHasher {
    calls: Cell<u32>,
}

impl CredentialHasher for CountingHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        self.calls.set(self.calls.get() + 1);
        Ok(format!("counted:{}", plaintext.len()))
    }

    fn verify(&self, _plaintext: &str, _hash: &str) -> Result<bool, CredentialError> {
        Ok(false)
    }
}

struct FailingHasher;

impl CredentialHasher for FailingHasher {
    fn hash(&self, _plaintext: &str) -> Result<String, CredentialError> {
        Err(CredentialError::Hash("backend unavailable".to_string()))
    }

    fn verify(&self, _plaintext: &str, _hash: &str) -> Result<bool, CredentialError> {
        Err(CredentialError::Hash("backend unavailable".to_string()))
    }
}
