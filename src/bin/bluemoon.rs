// bluemoon-rbac/src/bin/bluemoon.rs

use actix_web::{middleware::Logger, App, HttpServer};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use bluemoon_rbac::{
    configs::initializer::{
        bluemoon_initialize, configure_bluemoon_services, create_session_middleware,
        get_bluemoon_api_client, load_session_key, setup_bluemoon_logging, BluemoonConfig,
    },
    registry::{all_pages, register_default_pages},
    router::register_all_bluemoon_routes,
    utils::{
        guard::{guard, resolve_role, GuardDestinations, GuardOutcome},
        rbac::{regions_to_hide, standard_allow_list, AllowList, PageId},
        role::{normalize, CanonicalRole},
        session::{MemorySession, ROLE_KEY},
    },
};
use serde_json::json;

#[derive(Parser)]
#[command(name = "bluemoon")]
#[command(about = "BlueMoon front end and role/access inspection tool")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web front end
    Serve {
        /// Address to bind, overrides BLUEMOON_BIND
        #[arg(short, long)]
        bind: Option<String>,
        /// Upstream API base URL, overrides BLUEMOON_API_BASE
        #[arg(long)]
        api_base: Option<String>,
    },
    /// Normalize a raw role string
    Role {
        /// Raw role as stored in the session (e.g. "Ban Quản Lý")
        raw: String,
    },
    /// Decide whether a role may open a page
    Access {
        /// Raw role of the visitor
        #[arg(short, long)]
        role: String,
        /// Roles admitted by the page; defaults to the page's built-in list
        #[arg(short, long)]
        allow: Vec<String>,
        /// Page id (e.g. khoan-thu)
        #[arg(short, long)]
        page: Option<String>,
    },
    /// List the built-in pages and who may open them
    Pages,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, api_base } => serve(bind, api_base).await?,
        Commands::Role { raw } => show_role(&raw, cli.format)?,
        Commands::Access { role, allow, page } => show_access(&role, &allow, page.as_deref(), cli.format)?,
        Commands::Pages => list_pages(cli.format)?,
    }

    Ok(())
}

async fn serve(bind: Option<String>, api_base: Option<String>) -> Result<()> {
    let mut config = BluemoonConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind_address = bind;
    }
    if let Some(api_base) = api_base {
        config.api_base_url = api_base;
    }

    setup_bluemoon_logging(&config);
    bluemoon_initialize(&config)?;

    let key = load_session_key(&config)?;
    let client = get_bluemoon_api_client(&config)?;
    let bind_address = config.bind_address.clone();
    log::info!("🚀 BlueMoon listening on http://{}", bind_address);

    HttpServer::new(move || {
        let config = config.clone();
        let client = client.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(create_session_middleware(&config, key.clone()))
            .configure(|cfg| configure_bluemoon_services(cfg, config.clone(), client))
            .service(register_all_bluemoon_routes(&config))
    })
    .bind(&bind_address)
    .map_err(|e| anyhow!("cannot bind {}: {}", bind_address, e))?
    .run()
    .await?;

    Ok(())
}

fn role_name(role: &Option<CanonicalRole>) -> String {
    role.as_ref().map_or("(none)".to_string(), |r| r.to_string())
}

fn show_role(raw: &str, format: Format) -> Result<()> {
    let role = normalize(Some(raw));
    let hidden = role.as_ref().map(regions_to_hide).unwrap_or_default();

    match format {
        Format::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "raw": raw,
                    "role": role,
                    "code": role.as_ref().and_then(|r| r.code()),
                    "displayName": role.as_ref().map(|r| r.display_name()),
                    "hiddenRegions": hidden,
                }))?
            );
        }
        Format::Table => {
            println!("Raw role:       {}", raw);
            println!("Canonical role: {}", role_name(&role));
            if let Some(role) = &role {
                println!("Code:           {}", role.code().unwrap_or("-"));
                println!("Display name:   {}", role.display_name());
            }
            let hidden: Vec<_> = hidden.iter().map(|r| r.as_str()).collect();
            println!("Hidden regions: {}", if hidden.is_empty() { "-".to_string() } else { hidden.join(", ") });
        }
    }

    Ok(())
}

fn parse_allow_list(allow: &[String]) -> Result<AllowList> {
    allow
        .iter()
        .map(|raw| normalize(Some(raw)).ok_or_else(|| anyhow!("empty role in --allow")))
        .collect()
}

fn show_access(raw: &str, allow: &[String], page: Option<&str>, format: Format) -> Result<()> {
    let page_id = PageId::new(page.unwrap_or("custom"));
    let allowed = if allow.is_empty() {
        standard_allow_list(&page_id).unwrap_or_default()
    } else {
        parse_allow_list(allow)?
    };

    let session = MemorySession::new().with(ROLE_KEY, raw);
    let role = resolve_role(&session);
    let (granted, outcome) = match guard(&session, &page_id, &allowed, &GuardDestinations::default()) {
        GuardOutcome::Allowed(_) => (true, "allowed".to_string()),
        GuardOutcome::Denied(denial) => (false, format!("denied, redirect to {}", denial.destination)),
    };

    match format {
        Format::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "role": role,
                    "page": page_id,
                    "allowed": allowed,
                    "granted": granted,
                    "outcome": outcome,
                }))?
            );
        }
        Format::Table => {
            let allowed: Vec<_> = allowed.iter().map(|r| r.to_string()).collect();
            println!("Role:     {}", role_name(&role));
            println!("Page:     {}", page_id);
            println!("Allowed:  ADMIN{}", allowed.iter().map(|r| format!(", {}", r)).collect::<String>());
            println!("Outcome:  {}", outcome);
        }
    }

    Ok(())
}

fn list_pages(format: Format) -> Result<()> {
    register_default_pages();
    let pages = all_pages();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&pages)?),
        Format::Table => {
            println!("{:<18} {:<20} {:<14} {:<26} {:<30}", "ID", "Title", "Group", "Region", "Allowed");
            println!("{}", "-".repeat(110));

            for page in pages {
                let allowed: Vec<_> = page.allowed_roles.iter().map(|r| r.to_string()).collect();
                println!(
                    "{:<18} {:<20} {:<14} {:<26} {:<30}",
                    page.id.as_str(),
                    page.title,
                    page.group.as_deref().unwrap_or("-"),
                    page.region.map_or("-", |r| r.as_str()),
                    if allowed.is_empty() { "admin only".to_string() } else { allowed.join(", ") },
                );
            }
        }
    }

    Ok(())
}
