//! Tracked app management commands

use clap::{Args, Subcommand};
use revwatch_core::model::format_date;
use revwatch_core::{AppDocument, Config, TrackedApp};
use revwatch_db::{AppsRepo, Database};

/// Manage tracked apps
#[derive(Args, Debug)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: AppCommand,
}

/// Fields of an app document
#[derive(Args, Debug, Default)]
pub struct AppFields {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Icon URL shown next to each message
    #[arg(long)]
    pub icon: Option<String>,

    /// Play Store package name (e.g. com.example.app)
    #[arg(short, long)]
    pub package: Option<String>,

    /// Play Console developer account id
    #[arg(long)]
    pub developer_id: Option<String>,

    /// Play Console application id
    #[arg(long)]
    pub application_id: Option<String>,
}

impl AppFields {
    fn into_document(self) -> AppDocument {
        AppDocument {
            name: self.name,
            icon: self.icon,
            package_name: self.package,
            developer_id: self.developer_id,
            application_id: self.application_id,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Track a new app (ignored until enabled)
    Add {
        /// App id
        id: String,

        #[command(flatten)]
        fields: AppFields,

        /// Start checking the app right away
        #[arg(long)]
        enable: bool,
    },

    /// List tracked apps
    List,

    /// Show one app
    Show {
        /// App id
        id: String,
    },

    /// Change the fields of an app
    Update {
        /// App id
        id: String,

        #[command(flatten)]
        fields: AppFields,
    },

    /// Include an app in review checks
    Enable {
        /// App id
        id: String,
    },

    /// Exclude an app from review checks
    Disable {
        /// App id
        id: String,
    },

    /// Stop tracking an app
    Remove {
        /// App id
        id: String,
    },
}

impl AppArgs {
    /// Execute the app command
    pub async fn execute(self, config: &Config) -> anyhow::Result<()> {
        let db = Database::open(config.database.path.as_deref()).await?;
        let result = run(db.apps(), self.command).await;
        db.close().await;
        result
    }
}

async fn run(repo: AppsRepo, command: AppCommand) -> anyhow::Result<()> {
    match command {
        AppCommand::Add { id, fields, enable } => {
            let mut document = fields.into_document();
            document.ignored = Some(!enable);
            let app = repo.insert(&id, document).await?;
            println!("Added app {}", app.id);
            print_app(&app);
        }
        AppCommand::List => {
            let apps = repo.list().await?;
            if apps.is_empty() {
                println!("No apps tracked. Add one with `revwatch app add`.");
                return Ok(());
            }
            for app in &apps {
                println!("{:<20} {:<8} {}", app.id, status(app), app.display_name());
            }
        }
        AppCommand::Show { id } => print_app(&repo.get(&id).await?),
        AppCommand::Update { id, fields } => {
            let app = repo.update(&id, fields.into_document()).await?;
            println!("Updated app {}", app.id);
            print_app(&app);
        }
        AppCommand::Enable { id } => {
            repo.set_ignored(&id, false).await?;
            println!("Enabled app {}", id);
        }
        AppCommand::Disable { id } => {
            repo.set_ignored(&id, true).await?;
            println!("Disabled app {}", id);
        }
        AppCommand::Remove { id } => {
            repo.remove(&id).await?;
            println!("Removed app {}", id);
        }
    }

    Ok(())
}

fn status(app: &TrackedApp) -> &'static str {
    if app.is_invalid() {
        "invalid"
    } else if app.is_ignored() {
        "ignored"
    } else {
        "active"
    }
}

fn print_app(app: &TrackedApp) {
    println!("  id: {}", app.id);
    println!("  name: {}", app.name.as_deref().unwrap_or("-"));
    println!("  package: {}", app.package_name.as_deref().unwrap_or("-"));
    println!("  icon: {}", app.icon.as_deref().unwrap_or("-"));
    println!("  developer_id: {}", app.developer_id.as_deref().unwrap_or("-"));
    println!("  application_id: {}", app.application_id.as_deref().unwrap_or("-"));
    println!("  status: {}", status(app));
    match app.watermark {
        Some(ts) => println!("  watermark: {} ({})", ts, format_date(ts)),
        None => println!("  watermark: none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_enable_and_remove() {
        let db = Database::in_memory().await.unwrap();

        run(
            db.apps(),
            AppCommand::Add {
                id: "a1".to_string(),
                fields: AppFields {
                    package: Some("com.example".to_string()),
                    ..Default::default()
                },
                enable: false,
            },
        )
        .await
        .unwrap();
        let app = db.apps().get("a1").await.unwrap();
        assert_eq!(status(&app), "ignored");

        run(db.apps(), AppCommand::Enable { id: "a1".to_string() })
            .await
            .unwrap();
        assert_eq!(status(&db.apps().get("a1").await.unwrap()), "active");

        run(db.apps(), AppCommand::Remove { id: "a1".to_string() })
            .await
            .unwrap();
        assert!(db.apps().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_app_without_package_is_invalid() {
        let db = Database::in_memory().await.unwrap();
        run(
            db.apps(),
            AppCommand::Add {
                id: "a1".to_string(),
                fields: AppFields::default(),
                enable: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(status(&db.apps().get("a1").await.unwrap()), "invalid");
        assert!(run(db.apps(), AppCommand::Show { id: "nope".to_string() }).await.is_err());
    }
}
