//! Demo entry point.
//!
//! Seeds a database with one team and six members, then prints the first
//! page of members sorted by username and the member DTO projection.
//!
//! Usage: `roster_cli [DB_PATH]` (in-memory when no path is given).

use anyhow::Context;
use log::info;
use roster_core::db::{in_transaction, open_db, open_db_in_memory};
use roster_core::{
    init_logging, CrudRepository, Direction, LoggingConfig, Member, MemberField,
    MemberRepository, PageRequest, RepoError, Sort, SqliteMemberRepository,
    SqliteTeamRepository, Team, TeamRepository,
};

fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::from_env()).context("failed to initialize logging")?;
    println!("roster_core version={}", roster_core::core_version());

    let mut conn = match std::env::args_os().nth(1) {
        Some(path) => open_db(&path).with_context(|| format!("failed to open {path:?}"))?,
        None => open_db_in_memory().context("failed to open in-memory database")?,
    };

    in_transaction(&mut conn, |tx| -> Result<(), RepoError> {
        let teams = SqliteTeamRepository::try_new(tx)?;
        let members = SqliteMemberRepository::try_new(tx)?;

        let mut team_a = match teams.find_by_name("teamA")? {
            Some(team) => team,
            None => Team::new("teamA"),
        };
        teams.save(&mut team_a)?;

        for (idx, name) in ["member1", "member2", "member3", "member4", "member5", "member6"]
            .into_iter()
            .enumerate()
        {
            let mut member = if idx % 2 == 0 {
                Member::with_team(name, 10, &team_a)
            } else {
                Member::with_age(name, 10)
            };
            members.save(&mut member)?;
        }
        Ok(())
    })
    .context("failed to seed demo data")?;

    let members = SqliteMemberRepository::try_new(&conn)?;
    let request = PageRequest::of(0, 3, Sort::by(Direction::Desc, MemberField::Username))?;
    let page = members.find_by_age(10, &request)?;
    info!(
        "event=demo_page module=cli status=ok total={} pages={}",
        page.total_elements(),
        page.total_pages()
    );

    println!(
        "page {} of {} (total members: {})",
        page.number() + 1,
        page.total_pages(),
        page.total_elements()
    );
    for member in page.content() {
        println!("  {} age={}", member.username, member.age);
    }

    println!("members with a team:");
    for dto in members.find_member_dto()? {
        println!(
            "  {} age={} team={}",
            dto.username,
            dto.age,
            dto.team_name().unwrap_or("-")
        );
    }

    Ok(())
}
