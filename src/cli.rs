//! CLI harness: parse, prompts, and presentation only.
//!
//! The CLI is a host shim around the engine, not the product's view layer.
//! Confirmation prompts stand in for the warning gates a richer UI renders
//! as modals; no domain logic lives here.

use crate::config::OutreachConfig;
use crate::engine::OutreachEngine;
use crate::error::EngineError;
use crate::filter::{FilterState, GateOutcome, StatusFilterGate, StatusSelector};
use crate::handoff::LoggingHandoff;
use crate::identity::StaticActor;
use crate::overlay::SledStatusOverlay;
use crate::roster::HttpRosterProvider;
use crate::types::MergedContact;
use crate::workflow::{MessageDispatcher, MessageTemplate, Phase};
use chrono::{Local, Timelike};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "outreach", about = "Contact reconciliation and outreach workflow", version)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    Incomunicado,
    Comunicado,
    All,
}

impl From<StatusArg> for StatusSelector {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Incomunicado => StatusSelector::NotContacted,
            StatusArg::Comunicado => StatusSelector::Contacted,
            StatusArg::All => StatusSelector::All,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the roster and re-merge with the status overlay
    Sync,

    /// List contacts from the merged view
    List {
        /// Free-text search over name, phone, and email
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, value_enum, default_value_t = StatusArg::Incomunicado)]
        status: StatusArg,

        /// Exact locality match
        #[arg(long)]
        locality: Option<String>,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show the locality options present in the merged view
    Localities,

    /// Walk the contact workflow for one person
    Send {
        /// Contact identifier
        #[arg(long)]
        id: String,

        /// Template slug: initial-greeting, reminder, invitation,
        /// feedback-request, follow-up, custom
        #[arg(long, default_value = "initial-greeting")]
        template: String,

        /// Free-text body for the custom template
        #[arg(long)]
        message: Option<String>,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show one contact's merged profile and status
    Status {
        #[arg(long)]
        id: String,
    },
}

fn render_contacts_table(contacts: &[MergedContact]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ID", "Nombre", "Teléfono", "Localidad", "Estado", "Última comunicación", "Comunicado por",
    ]);
    for contact in contacts {
        table.add_row(vec![
            contact.id().to_string(),
            contact.name().to_string(),
            contact.record.phone.clone().unwrap_or_default(),
            contact.record.locality.clone().unwrap_or_default(),
            contact.state.to_string(),
            contact
                .last_contacted_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "Nunca".to_string()),
            contact.contacted_by.clone().unwrap_or_default(),
        ]);
    }
    table
}

fn print_summary(engine: &OutreachEngine) {
    let merged = engine.merged();
    let contacted = merged.iter().filter(|c| c.is_contacted()).count();
    println!(
        "Total: {}  {}  {}",
        merged.len(),
        format!("Comunicados: {}", contacted).green(),
        format!("Incomunicados: {}", merged.len() - contacted).yellow()
    );
}

async fn build_engine(config: &OutreachConfig) -> anyhow::Result<OutreachEngine> {
    config.validate()?;
    let roster = Arc::new(HttpRosterProvider::new(config.roster_endpoint.clone())?);
    let overlay = Arc::new(SledStatusOverlay::open(&config.overlay_path)?);
    Ok(OutreachEngine::new(roster, overlay))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = OutreachConfig::load(cli.config.as_deref())?;
    crate::logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Sync => {
            let engine = build_engine(&config).await?;
            let count = engine.sync().await?;
            println!("Synced {} contacts", count);
            print_summary(&engine);
        }

        Commands::List {
            search,
            status,
            locality,
            yes,
        } => {
            let engine = build_engine(&config).await?;
            engine.sync().await?;

            // The contacted list is gated: every attempt warns before showing.
            let mut gate = StatusFilterGate::default();
            if gate.request(status.into()) == GateOutcome::ConfirmationRequired {
                let confirmed = yes
                    || Confirm::new()
                        .with_prompt(
                            "Estás a punto de ver contactos ya comunicados. \
                             Para evitar el spam, contactalos solo si es necesario. ¿Continuar?",
                        )
                        .default(false)
                        .interact()?;
                if confirmed {
                    gate.confirm();
                } else {
                    gate.decline();
                }
            }

            let filter = FilterState {
                search,
                status: gate.active(),
                locality,
            };
            let visible = engine.visible(&filter);
            if visible.is_empty() {
                println!("No se encontraron contactos con los filtros aplicados.");
            } else {
                println!("{}", render_contacts_table(&visible));
            }
            print_summary(&engine);
        }

        Commands::Localities => {
            let engine = build_engine(&config).await?;
            engine.sync().await?;
            for locality in engine.locality_options() {
                println!("{}", locality);
            }
        }

        Commands::Send {
            id,
            template,
            message,
            yes,
        } => {
            let engine = build_engine(&config).await?;
            engine.sync().await?;

            let mut session = engine.begin_contact(&id)?;
            let overlay = engine.overlay();
            let actor = StaticActor::new(config.actor_name.clone());
            let handoff = LoggingHandoff;
            let dispatcher = MessageDispatcher::new(
                overlay.as_ref(),
                &handoff,
                &actor,
                &config.messaging.link,
                &config.messaging.organization,
            );

            if session.begin()? == Phase::WarningGate {
                let contacted_by = session
                    .contact()
                    .contacted_by
                    .clone()
                    .unwrap_or_else(|| "otro operador".to_string());
                let proceed = yes
                    || Confirm::new()
                        .with_prompt(format!(
                            "Este contacto ya fue comunicado por {}. ¿Enviar otro mensaje?",
                            contacted_by
                        ))
                        .default(false)
                        .interact()?;
                if proceed {
                    session.acknowledge_warning()?;
                } else {
                    session.decline_warning()?;
                    println!("{}", "Envío cancelado.".yellow());
                    return Ok(());
                }
            }

            session.choose_template(MessageTemplate::from_slug(&template, message)?)?;

            let hour = Local::now().hour();
            let body = session.preview(&config.messaging.organization, hour)?;
            println!("Mensaje que se enviará:\n{}\n", body);

            let proceed = yes
                || Confirm::new()
                    .with_prompt(format!("¿Enviar a {}?", session.contact().name()))
                    .default(true)
                    .interact()?;
            if !proceed {
                session.cancel()?;
                println!("{}", "Envío cancelado.".yellow());
                return Ok(());
            }

            // A failed status commit keeps the draft; offer a retry loop.
            loop {
                match dispatcher.send(&mut session).await {
                    Ok(link) => {
                        println!("{}", "Mensaje preparado. Abrí el enlace:".green());
                        println!("{}", link.url);
                        break;
                    }
                    Err(EngineError::OverlayWriteFailed(reason)) => {
                        eprintln!("{} {}", "No se pudo guardar el estado:".red(), reason);
                        let retry = !yes
                            && Confirm::new()
                                .with_prompt("¿Reintentar?")
                                .default(true)
                                .interact()?;
                        if !retry {
                            session.cancel()?;
                            break;
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Commands::Status { id } => {
            let engine = build_engine(&config).await?;
            engine.sync().await?;
            match engine.find(&id) {
                Some(contact) => {
                    println!("{}", render_contacts_table(std::slice::from_ref(&contact)));
                }
                None => {
                    eprintln!("Contacto no encontrado: {}", id);
                }
            }
        }
    }

    Ok(())
}
