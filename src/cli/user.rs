//! User commands: add, list, remove, verify.

use clap::{Subcommand, ValueEnum};
use jiff::Timestamp;
use uuid::Uuid;

use crate::auth;
use crate::model::{Role, User};
use crate::storage::{Storage, StorageError};

use super::format::short_id;

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a user. Prints the user ID.
    Add {
        /// Given name.
        #[arg(long)]
        name: String,

        /// Paternal surname.
        #[arg(long)]
        surname: String,

        /// Maternal surname, if any.
        #[arg(long)]
        second_surname: Option<String>,

        /// Login email. Must be unique.
        #[arg(long)]
        email: String,

        #[arg(long, value_enum)]
        role: RoleArg,

        /// Password for the account. Stored only as a salted digest.
        #[arg(long)]
        password: String,
    },

    /// List users.
    List,

    /// Delete a user.
    Remove {
        /// User ID: full UUID or unambiguous prefix.
        user: String,
    },

    /// Check an email/password pair. Prints the user's role on success.
    Verify { email: String, password: String },
}

/// CLI-facing role, mapped to the domain `Role`.
#[derive(Debug, Clone, ValueEnum)]
pub enum RoleArg {
    /// Manages users, vehicles, and dispatch.
    Admin,
    /// Drives an assigned vehicle.
    Driver,
}

impl RoleArg {
    fn to_domain(&self) -> Role {
        match self {
            Self::Admin => Role::Admin,
            Self::Driver => Role::Driver,
        }
    }
}

pub(super) fn run(storage: &Storage, command: UserCommand) -> Result<(), String> {
    match command {
        UserCommand::Add {
            name,
            surname,
            second_surname,
            email,
            role,
            password,
        } => cmd_add(storage, name, surname, second_surname, email, &role, password),
        UserCommand::List => cmd_list(storage),
        UserCommand::Remove { user } => cmd_remove(storage, &user),
        UserCommand::Verify { email, password } => cmd_verify(storage, &email, &password),
    }
}

fn cmd_add(
    storage: &Storage,
    name: String,
    surname: String,
    second_surname: Option<String>,
    email: String,
    role: &RoleArg,
    password: String,
) -> Result<(), String> {
    let user = User {
        id: Uuid::new_v4(),
        name,
        surname,
        second_surname,
        email,
        password_digest: auth::digest(&password),
        role: role.to_domain(),
        created_at: Timestamp::now(),
    };
    user.validate().map_err(|e| e.to_string())?;

    storage
        .create_user(&user)
        .map_err(|e| format!("failed to create user: {e}"))?;

    println!("{}", user.id);
    Ok(())
}

fn cmd_list(storage: &Storage) -> Result<(), String> {
    let users = storage
        .list_users()
        .map_err(|e| format!("failed to list users: {e}"))?;

    if users.is_empty() {
        println!("No users");
        return Ok(());
    }

    for u in &users {
        println!(
            "{}  [{}]  {}  {}",
            short_id(u.id),
            u.role.as_str(),
            u.email,
            u.full_name()
        );
    }

    Ok(())
}

fn cmd_remove(storage: &Storage, reference: &str) -> Result<(), String> {
    let user = super::resolve_user(storage, reference)?;
    storage
        .delete_user(user.id)
        .map_err(|e| format!("failed to delete user: {e}"))?;
    eprintln!("User {} removed", short_id(user.id));
    Ok(())
}

fn cmd_verify(storage: &Storage, email: &str, password: &str) -> Result<(), String> {
    let user = match storage.find_user_by_email(email) {
        Ok(u) => u,
        Err(StorageError::EmailNotFound(_)) => {
            return Err(format!("no user with email {email}"));
        }
        Err(e) => return Err(format!("lookup failed: {e}")),
    };

    if !auth::verify(password, &user.password_digest) {
        return Err("incorrect password".to_string());
    }

    println!("{}", user.role.as_str());
    eprintln!("Welcome, {}", user.full_name());
    Ok(())
}
