use crate::error::DeployResult;
use crate::remote::RemoteCommand;
use crate::ssh::quote;
use crate::steps::StepContext;

/// Escape a value for a single-quoted SQL literal.
fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Run one statement as the `postgres` superuser.
fn psql(ctx: &StepContext, statement: &str) -> DeployResult<String> {
    let command = RemoteCommand::new(format!("psql -c {}", quote(statement)?))
        .sudo_as("postgres")
        .redact(&ctx.config.password);
    ctx.remote.exec(&command)
}

/// Whether a catalog query returns a row. Login shell noise may
/// precede the result on the same stream.
fn psql_has_row(ctx: &StepContext, query: &str) -> DeployResult<bool> {
    let command = RemoteCommand::new(format!("psql -tAc {}", quote(query)?)).sudo_as("postgres");
    Ok(ctx.remote.exec(&command)?.lines().any(|l| l.trim() == "1"))
}

/// Statements creating the application role's settings and
/// grants, in execution order. The database and role creation
/// statements precede these.
#[must_use]
pub fn role_statements(user: &str, database: &str) -> Vec<String> {
    vec![
        format!("ALTER ROLE {user} SET client_encoding TO 'utf8';"),
        format!("ALTER ROLE {user} SET default_transaction_isolation TO 'read committed';"),
        format!("ALTER ROLE {user} SET timezone TO 'UTC';"),
        format!("GRANT ALL PRIVILEGES ON DATABASE {database} TO {user};"),
    ]
}

/// Create the application database and role and grant the role
/// full privileges. Statements run one by one; a failure part way
/// leaves whatever already succeeded in place.
pub fn create_database(ctx: &StepContext) -> DeployResult<()> {
    let database = ctx.config.database_name();
    let user = &ctx.config.user_name;

    if psql_has_row(
        ctx,
        &format!("SELECT 1 FROM pg_database WHERE datname = '{database}'"),
    )? {
        tracing::info!("database {database} already exists");
    } else {
        psql(ctx, &format!("CREATE DATABASE {database};"))?;
    }

    if psql_has_row(
        ctx,
        &format!("SELECT 1 FROM pg_roles WHERE rolname = '{user}'"),
    )? {
        tracing::info!("role {user} already exists");
    } else {
        psql(
            ctx,
            &format!(
                "CREATE USER {user} WITH PASSWORD '{}';",
                sql_literal(&ctx.config.password)
            ),
        )?;
    }

    for statement in role_statements(user, &database) {
        psql(ctx, &statement)?;
    }
    Ok(())
}
