use anyhow::bail;
use clap::Args;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::permissions::list_all_permissions;
use crate::services::{CreateUserRequest, UserService};

use super::serve::open_repository;

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long, help = "Login email")]
    pub email: String,

    #[arg(long, help = "Display name")]
    pub name: String,

    #[arg(long, help = "Initial password (at least 6 characters)")]
    pub password: String,

    #[arg(long, value_delimiter = ',', help = "Comma-separated permission identifiers")]
    pub permissions: Vec<String>,

    #[arg(long, conflicts_with = "permissions", help = "Grant every permission in the catalog")]
    pub all_permissions: bool,
}

impl CreateUserArgs {
    fn into_request(self) -> CreateUserRequest {
        let permissions = if self.all_permissions {
            list_all_permissions().into_iter().map(String::from).collect()
        } else {
            self.permissions
        };
        CreateUserRequest {
            email: self.email,
            password: self.password,
            name: self.name,
            permissions: Some(permissions),
        }
    }
}

pub async fn handle(args: CreateUserArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    if config.database.url.is_none() {
        bail!("create-user needs DATABASE_URL; the in-memory store does not outlive this command");
    }

    let repo = open_repository(config).await?;
    match UserService::new(repo).create(args.into_request()).await {
        Ok(user) => output_success(
            &output_format,
            &format!("User {} created", user.email),
            Some(json!({ "user": user })),
        ),
        Err(e) => {
            output_error(&output_format, e.message())?;
            bail!("{}", e.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_permissions_expands_to_catalog() {
        let args = CreateUserArgs {
            email: "root@example.com".into(),
            name: "Root".into(),
            password: "changeme".into(),
            permissions: vec![],
            all_permissions: true,
        };
        let request = args.into_request();
        assert_eq!(request.permissions.map(|p| p.len()), Some(list_all_permissions().len()));
    }
}
