use roster_core::db::migrations::latest_version;
use roster_core::db::open_db_in_memory;
use roster_core::{
    CrudRepository, Entity, Member, MemberRepository, RepoError, SqliteMemberRepository,
    SqliteTeamRepository, Team, TeamRef, ValidationError,
};
use rusqlite::Connection;

#[test]
fn basic_crud() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member1 = Member::new("member1");
    let mut member2 = Member::new("member2");
    repo.save(&mut member1).unwrap();
    repo.save(&mut member2).unwrap();

    let find_member1 = repo.find_by_id(member1.id().unwrap()).unwrap().unwrap();
    let find_member2 = repo.find_by_id(member2.id().unwrap()).unwrap().unwrap();
    assert_eq!(find_member1, member1);
    assert_eq!(find_member2, member2);
    assert_eq!(find_member1.username, "member1");
    assert_eq!(find_member1.age, 0);

    assert_eq!(repo.find_all().unwrap().len(), 2);
    assert_eq!(repo.count().unwrap(), 2);

    repo.delete(&member1).unwrap();
    repo.delete(&member2).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn save_assigns_identity_once_and_then_updates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("member1", 10);
    assert!(member.is_new());
    let id = repo.save(&mut member).unwrap();
    assert_eq!(member.id(), Some(id));

    member.username = "renamed".to_string();
    member.age = 11;
    let same_id = repo.save(&mut member).unwrap();
    assert_eq!(same_id, id);
    assert_eq!(repo.count().unwrap(), 1);

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.username, "renamed");
    assert_eq!(loaded.age, 11);
}

#[test]
fn count_reflects_saves_minus_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut members: Vec<Member> = (0..7)
        .map(|idx| Member::with_age(format!("member{idx}"), idx))
        .collect();
    for member in &mut members {
        repo.save(member).unwrap();
    }

    for member in members.iter().take(3) {
        repo.delete(member).unwrap();
    }

    assert_eq!(repo.count().unwrap(), 4);
    assert!(!repo.exists_by_id(members[0].id().unwrap()).unwrap());
    assert!(repo.exists_by_id(members[6].id().unwrap()).unwrap());
}

#[test]
fn find_by_id_miss_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    assert!(repo.find_by_id(42).unwrap().is_none());
}

#[test]
fn deleting_absent_member_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::new("member1");
    let id = repo.save(&mut member).unwrap();
    repo.delete(&member).unwrap();

    let err = repo.delete(&member).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: "member", id: missing } if missing == id
    ));
}

#[test]
fn deleting_transient_member_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let err = repo.delete(&Member::new("never saved")).unwrap_err();
    assert!(matches!(err, RepoError::TransientEntity("member")));
}

#[test]
fn updating_removed_member_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::new("member1");
    let id = repo.save(&mut member).unwrap();
    repo.delete_by_id(id).unwrap();

    member.age = 30;
    let err = repo.save(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: missing, .. } if missing == id));
}

#[test]
fn validation_failure_blocks_save_and_leaves_member_untouched() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::new("  ");
    let err = repo.save(&mut member).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankUsername)
    ));
    assert!(member.is_new());
    assert_eq!(member.audit().created_at, None);
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn team_association_is_stored_and_loaded_on_request() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    let team_id = teams.save(&mut team).unwrap();
    let mut member = Member::with_team("member1", 10, &team);
    let id = members.save(&mut member).unwrap();

    let plain = members.find_by_id(id).unwrap().unwrap();
    assert_eq!(plain.team_ref(), Some(&TeamRef::Unloaded(team_id)));
    assert!(plain.team().is_none());

    let with_team = members.find_by_id_with_team(id).unwrap().unwrap();
    assert_eq!(with_team.team().map(|t| t.name.as_str()), Some("teamA"));
    assert_eq!(with_team.team_id(), Some(team_id));
}

#[test]
fn saving_member_with_unsaved_team_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let transient_team = Team::new("teamA");
    let mut member = Member::with_team("member1", 10, &transient_team);
    let err = repo.save(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::TransientReference));
    assert!(member.is_new());
}

#[test]
fn dangling_team_reference_is_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    teams.save(&mut team).unwrap();
    teams.delete(&team).unwrap();

    let mut member = Member::with_team("member1", 10, &team);
    let err = members.save(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn clearing_team_persists_null_reference() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    teams.save(&mut team).unwrap();
    let mut member = Member::with_team("member1", 10, &team);
    let id = members.save(&mut member).unwrap();

    member.clear_team();
    members.save(&mut member).unwrap();

    let loaded = members.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.team_id(), None);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteMemberRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_member_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE team (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMemberRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("member"))
    ));
}

#[test]
fn repository_rejects_member_table_without_audit_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE team (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE member (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            age INTEGER NOT NULL DEFAULT 0,
            team_id INTEGER NULL
         );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMemberRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "member",
            column: "created_at"
        })
    ));
}

#[test]
fn team_assigned_before_its_save_must_be_reassigned() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    let mut member = Member::with_team("member1", 10, &team);
    let team_id = teams.save(&mut team).unwrap();

    let err = members.save(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::TransientReference));
    assert!(err.to_string().contains("save the team, then assign it"));
    assert!(member.is_new());

    member.change_team(&team);
    let id = members.save(&mut member).unwrap();
    let stored = members.find_by_id(id).unwrap().unwrap();
    assert_eq!(stored.team_id(), Some(team_id));
    assert_eq!(members.find_by_team(team_id).unwrap(), vec![stored]);
}

#[test]
fn decoded_member_never_carries_identity_or_audit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut existing = Member::with_age("member1", 30);
    let existing_id = repo.save(&mut existing).unwrap();

    let decoded: Member = serde_json::from_value(serde_json::json!({
        "id": existing_id,
        "username": "member2",
        "age": 99,
        "team": null,
        "audit": {
            "created_at": 1,
            "created_by": "someone",
            "modified_at": 2,
            "modified_by": "someone"
        }
    }))
    .unwrap();
    assert!(decoded.is_new());
    assert_eq!(decoded.audit().created_at, None);
    assert_eq!(decoded.audit().modified_at, None);

    let mut decoded = decoded;
    let new_id = repo.save(&mut decoded).unwrap();
    assert_ne!(new_id, existing_id);

    let untouched = repo.find_by_id(existing_id).unwrap().unwrap();
    assert_eq!(untouched.username, "member1");
    assert_eq!(untouched.age, 30);
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn decoded_team_is_transient() {
    let team: Team = serde_json::from_value(serde_json::json!({
        "id": 7,
        "name": "teamA"
    }))
    .unwrap();
    assert!(team.is_new());
    assert_eq!(team.name, "teamA");
}

#[test]
fn repository_reports_non_database_file_as_connection_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-a-db.txt");
    std::fs::write(&path, "plain text, not a sqlite database\n".repeat(64)).unwrap();

    let conn = Connection::open(&path).unwrap();
    match SqliteMemberRepository::try_new(&conn) {
        Err(RepoError::ConnectionFailure(message)) => assert!(!message.is_empty()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected connection failure"),
    }
}
