//
// cli.rs
// Imaging-Workflow-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the corresponding modules.
//
// Thales Matheus Mendonça Santos - February 2026

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DemoConfig;
use crate::worklist::WorklistEntry;
use crate::{acquire, demo, scu, transmit, worklist};

/// Command-line interface glue code: defines the available verbs and dispatches to modules.
#[derive(Parser)]
#[command(name = "imaging-workflow")]
#[command(about = "DICOM imaging workflow demo against a local Orthanc", long_about = None)]
pub struct Cli {
    /// Host of the DICOM peer
    #[arg(long, global = true)]
    pub peer: Option<String>,
    /// DICOM port of the peer
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Called application entity title
    #[arg(long, global = true)]
    pub called_aet: Option<String>,
    /// Calling application entity title
    #[arg(long, global = true)]
    pub calling_aet: Option<String>,
    /// Base URL of the Orthanc HTTP API
    #[arg(long, global = true)]
    pub orthanc_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole workflow: worklist, query, acquisition, transmission
    Demo,
    /// Create a modality worklist entry file
    CreateWorklist {
        #[arg(long, default_value = "DOE^JOHN")]
        patient_name: String,
        #[arg(long, default_value = "PID0001")]
        patient_id: String,
        #[arg(long, default_value = "CT")]
        modality: String,
        /// Directory watched by the worklist plugin
        #[arg(long)]
        worklist_dir: Option<PathBuf>,
    },
    /// Query the modality worklist and print the scheduled steps
    FindMwl,
    /// Acquire the first scheduled step into the samples directory
    Acquire,
    /// Perform a DICOM C-ECHO (Ping)
    Echo,
    /// Send a study to the PACS and export it as FHIR (best effort)
    SendStudy { file: PathBuf },
    /// Export an already-stored study as a FHIR ImagingStudy
    ExportFhir {
        study_uid: String,
        /// Subject reference recorded on the resource
        #[arg(long)]
        patient_ref: Option<String>,
    },
}

pub fn run() -> anyhow::Result<()> {
    // Parse the raw CLI arguments once and dispatch to a subcommand handler.
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    match cli.command {
        Commands::Demo => demo::run(&config)?,
        Commands::CreateWorklist {
            patient_name,
            patient_id,
            modality,
            worklist_dir,
        } => {
            let entry = WorklistEntry {
                patient_name,
                patient_id,
                modality,
                ..WorklistEntry::default()
            };
            let dir = worklist_dir.unwrap_or_else(|| config.worklist_dir.clone());
            worklist::create_worklist_file(&entry, &dir)?;
        }
        Commands::FindMwl => demo::print_worklist(&config)?,
        Commands::Acquire => {
            acquire::acquire_from_worklist(&config)?;
        }
        Commands::Echo => {
            let status = scu::echo(
                &config.dicom_addr(),
                &config.calling_aet,
                &config.called_aet,
            )?;
            println!("C-ECHO status: 0x{:04X}", status);
        }
        Commands::SendStudy { file } => transmit::send_study(&config, &file)?,
        Commands::ExportFhir {
            study_uid,
            patient_ref,
        } => {
            let mut config = config;
            if let Some(patient_ref) = patient_ref {
                config.patient_ref = patient_ref;
            }
            transmit::export_study(&config, &study_uid)?;
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> DemoConfig {
    let mut config = DemoConfig::default();
    if let Some(peer) = &cli.peer {
        config.peer_host = peer.clone();
    }
    if let Some(port) = cli.port {
        config.peer_port = port;
    }
    if let Some(called) = &cli.called_aet {
        config.called_aet = called.clone();
    }
    if let Some(calling) = &cli.calling_aet {
        config.calling_aet = calling.clone();
    }
    if let Some(url) = &cli.orthanc_url {
        config.orthanc_url = url.trim_end_matches('/').to_string();
    }
    config
}
