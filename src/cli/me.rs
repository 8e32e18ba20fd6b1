use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use graph_shaper::api::UserService;
use graph_shaper::types::Profile;

use super::output::{print_output, print_single, print_success, print_warning};
use super::{AppContext, OutputFormat};

#[derive(Args, Debug)]
pub struct MeCommand {
    #[command(subcommand)]
    pub command: MeSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum MeSubcommand {
    /// Show the signed-in user's profile
    Profile,

    /// Show a link to the signed-in user's photo
    Photo {
        /// Name used for the generated avatar when no photo is available
        #[arg(short, long)]
        name: Option<String>,

        /// Write the photo to this file instead
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Job Title")]
    job_title: String,
    #[tabled(rename = "Office")]
    office: String,
}

impl From<Profile> for ProfileRow {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id.unwrap_or_default(),
            name: profile.display_name.unwrap_or_default(),
            email: profile
                .mail
                .or(profile.user_principal_name)
                .unwrap_or_default(),
            job_title: profile.job_title.unwrap_or_default(),
            office: profile.office_location.unwrap_or_default(),
        }
    }
}

pub async fn execute(cmd: MeCommand, ctx: &AppContext) -> Result<()> {
    let service = user_service(ctx);
    match cmd.command {
        MeSubcommand::Profile => profile(&service, ctx.format).await,
        MeSubcommand::Photo { name, output } => match output {
            Some(path) => save_photo(&service, &path).await,
            None => photo(&service, name.as_deref(), ctx.format).await,
        },
    }
}

fn user_service(ctx: &AppContext) -> UserService {
    // Configured base URL and extra headers apply; version and scope are pinned.
    UserService::from_options(ctx.config.api.service_options(ctx.token.as_deref()))
}

async fn profile(service: &UserService, format: OutputFormat) -> Result<()> {
    let record = service.get_profile().await?;

    match format {
        OutputFormat::Json => print_single(&record, format),
        OutputFormat::Table | OutputFormat::Plain => {
            let row = ProfileRow::from(Profile::from_record(&record));
            print_output(&[row], format)
        }
    }
}

#[derive(Debug, Serialize)]
struct PhotoOutput<'a> {
    url: &'a str,
    fallback: bool,
}

async fn photo(service: &UserService, name: Option<&str>, format: OutputFormat) -> Result<()> {
    let reference = service.get_photo(name).await;
    if reference.is_fallback() {
        print_warning("No photo available, using generated avatar");
    }

    match format {
        OutputFormat::Json => print_single(
            &PhotoOutput {
                url: reference.as_str(),
                fallback: reference.is_fallback(),
            },
            format,
        ),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("{}", reference);
            Ok(())
        }
    }
}

async fn save_photo(service: &UserService, path: &Path) -> Result<()> {
    let blob = service.photo_blob().await?;
    fs::write(path, blob.bytes())
        .with_context(|| format!("Failed to write photo: {:?}", path))?;
    print_success(&format!(
        "Saved {} bytes ({}) to {}",
        blob.len(),
        blob.content_type().unwrap_or("unknown type"),
        path.display()
    ));
    Ok(())
}
