// Slate Log CLI binary

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use anyhow::Result;
use rusqlite::Connection;

use slate_log_lib::continuity::assembly::{commit_entry, prime_next_form, CommitOptions, CommitOutcome};
use slate_log_lib::continuity::predict::predict_next;
use slate_log_lib::continuity::{parse_slot, Classification, ClassificationChoice, EntryForm, Slot, WasteSelection};
use slate_log_lib::db::schema::{self, LogEntry, Project};
use slate_log_lib::db::{default_db_path, open_db};
use slate_log_lib::licensing::{self, LicenseType};
use slate_log_lib::settings::{self, CustomField, OptionalField, ProjectSettings};

#[derive(Parser)]
#[command(name = "slatelog")]
#[command(about = "Slate Log - take logging with continuity checks for film and video shoots", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (defaults to ~/.slatelog/slatelog.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Project name (defaults to the active project)
    #[arg(short, long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database
    Init,

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Show the predicted values for the next entry
    Next,

    /// Log a take. Unset values are taken from the prediction.
    Log {
        #[arg(long)]
        scene: Option<String>,
        #[arg(long)]
        shot: Option<String>,
        #[arg(long)]
        take: Option<String>,
        /// Sound file number or range, e.g. 0012 or 0012-0014
        #[arg(long)]
        sound: Option<String>,
        /// Camera file number or range, once per channel in order
        #[arg(long = "camera")]
        cameras: Vec<String>,
        /// normal, waste, insert, ambience or sfx
        #[arg(long, default_value = "normal")]
        classification: String,
        /// Waste: the camera was rolling
        #[arg(long)]
        waste_camera: bool,
        /// Waste: sound was rolling
        #[arg(long)]
        waste_sound: bool,
        /// Insert: recorded without sound speed
        #[arg(long)]
        no_speed: bool,
        /// No sound recorded
        #[arg(long)]
        mos: bool,
        /// Camera channel (1-based) that was not recording
        #[arg(long = "inactive")]
        inactive: Vec<usize>,
        /// Renumber the conflicting entry and its chain to make room
        #[arg(long)]
        insert_before: bool,
        /// Bump existing takes from this take upward on a take conflict
        #[arg(long)]
        shift_takes: bool,
        #[arg(long)]
        episode: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        cards: Option<String>,
        /// Custom field value as key=value
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// List entries of the project
    List {
        /// Maximum entries to show (most recent)
        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Manage the license
    #[command(subcommand)]
    License(LicenseCommand),

    /// Set log level (debug, info, warn, error)
    SetLogLevel {
        level: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project and make it active
    Create {
        name: String,
        /// Number of camera channels
        #[arg(long, default_value = "1")]
        cameras: usize,
        /// The project records no sound
        #[arg(long)]
        no_sound: bool,
    },
    /// List projects
    List,
    /// Show project settings
    Show,
    /// Change the number of camera channels
    SetCameras {
        count: usize,
    },
    /// Enable an optional field (episode, sound, description, notes, cards) or add a custom field
    Enable {
        field: String,
        /// Label for a custom field
        #[arg(long)]
        label: Option<String>,
    },
    /// Disable an optional field or remove a custom field
    Disable {
        field: String,
    },
    /// Make a project the active one
    Use {
        name: String,
    },
}

#[derive(Subcommand)]
enum LicenseCommand {
    /// Show license status
    Status,
    /// Activate a license key
    Activate {
        key: String,
    },
    /// Remove the installed key
    Deactivate,
    /// Generate a key (purchased, rental, dev)
    Generate {
        license_type: String,
        #[arg(long, default_value = "1")]
        count: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let conn = open_db(&db_path)?;
    init_logging(&conn)?;

    let project = cli.project;
    match cli.command {
        Commands::Init => {
            println!("Database ready at {}", db_path.display());
            Ok(())
        }
        Commands::Project(cmd) => cmd_project(&conn, project, cmd),
        Commands::Next => cmd_next(&conn, project),
        Commands::Log {
            scene, shot, take, sound, cameras, classification, waste_camera, waste_sound,
            no_speed, mos, inactive, insert_before, shift_takes, episode, description, notes,
            cards, fields,
        } => {
            let input = LogInput {
                scene, shot, take, sound, cameras, classification, waste_camera, waste_sound,
                no_speed, mos, inactive, episode, description, notes, cards, fields,
            };
            let options = CommitOptions {
                confirm_insert: insert_before,
                shift_takes_on_conflict: shift_takes,
            };
            cmd_log(&conn, project, input, options)
        }
        Commands::List { limit } => cmd_list(&conn, project, limit),
        Commands::License(cmd) => cmd_license(cmd),
        Commands::SetLogLevel { level } => {
            settings::set_log_level(&conn, &level)?;
            println!("Log level set to {}", level.to_lowercase());
            Ok(())
        }
    }
}

/// Install env_logger at the stored level. RUST_LOG still wins when set.
fn init_logging(conn: &Connection) -> Result<()> {
    let app = settings::load_app_settings(conn)?;
    let level = settings::parse_log_level(&app.log_level).unwrap_or(log::LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
    Ok(())
}

fn cmd_project(conn: &Connection, selected: Option<String>, cmd: ProjectCommand) -> Result<()> {
    match cmd {
        ProjectCommand::Create { name, cameras, no_sound } => {
            if schema::get_project_by_name(conn, &name)?.is_some() {
                anyhow::bail!("Project '{}' already exists", name);
            }
            let mut project_settings = ProjectSettings::with_cameras(cameras);
            if no_sound {
                project_settings.enabled_fields.remove(&OptionalField::SoundFile);
            }
            let id = schema::insert_project(conn, &name, &project_settings)?;
            settings::set_active_project(conn, id)?;
            println!("Created project '{}' with {} camera channel(s)", name, project_settings.channels());
        }
        ProjectCommand::List => {
            let active = settings::load_app_settings(conn)?.active_project;
            let projects = schema::list_projects(conn)?;
            if projects.is_empty() {
                println!("No projects yet. Use 'slatelog project create <name>' to start one.");
                return Ok(());
            }
            println!("{:>4}  {:>7}  {:>7}  {}", "ID", "Cameras", "Entries", "Name");
            println!("{}", "-".repeat(50));
            for p in projects {
                let marker = if Some(p.id) == active { " *" } else { "" };
                println!(
                    "{:>4}  {:>7}  {:>7}  {}{}",
                    p.id,
                    p.settings.channels(),
                    schema::count_entries(conn, p.id)?,
                    p.name,
                    marker
                );
            }
        }
        ProjectCommand::Show => {
            let project = resolve_project(conn, selected)?;
            print_project(conn, &project)?;
        }
        ProjectCommand::SetCameras { count } => {
            let mut project = resolve_project(conn, selected)?;
            project.settings.camera_channel_count = count;
            schema::update_project_settings(conn, project.id, &project.settings)?;
            println!("Project '{}' now has {} camera channel(s)", project.name, project.settings.channels());
        }
        ProjectCommand::Enable { field, label } => {
            let mut project = resolve_project(conn, selected)?;
            match field.parse::<OptionalField>() {
                Ok(optional) => {
                    project.settings.enabled_fields.insert(optional);
                }
                Err(_) => {
                    let key = field.trim().to_lowercase();
                    if !project.settings.custom_fields.iter().any(|f| f.key == key) {
                        project.settings.custom_fields.push(CustomField {
                            label: label.unwrap_or_else(|| field.trim().to_string()),
                            key,
                        });
                    }
                }
            }
            schema::update_project_settings(conn, project.id, &project.settings)?;
            println!("Enabled '{}' on project '{}'", field, project.name);
        }
        ProjectCommand::Disable { field } => {
            let mut project = resolve_project(conn, selected)?;
            match field.parse::<OptionalField>() {
                Ok(optional) => {
                    project.settings.enabled_fields.remove(&optional);
                }
                Err(_) => {
                    let key = field.trim().to_lowercase();
                    project.settings.custom_fields.retain(|f| f.key != key);
                }
            }
            schema::update_project_settings(conn, project.id, &project.settings)?;
            println!("Disabled '{}' on project '{}'", field, project.name);
        }
        ProjectCommand::Use { name } => {
            let project = schema::get_project_by_name(conn, &name)?
                .ok_or_else(|| anyhow::anyhow!("Project '{}' not found", name))?;
            settings::set_active_project(conn, project.id)?;
            println!("Active project: {}", project.name);
        }
    }
    Ok(())
}

fn print_project(conn: &Connection, project: &Project) -> Result<()> {
    let s = &project.settings;
    println!("Project #{}", project.id);
    println!();
    println!("Name:        {}", project.name);
    println!("Cameras:     {}", s.channels());
    println!("Sound:       {}", if s.sound_enabled() { "recorded" } else { "none" });
    let fields: Vec<String> = s.enabled_fields.iter().map(|f| format!("{:?}", f)).collect();
    println!("Fields:      {}", fields.join(", "));
    if !s.custom_fields.is_empty() {
        let custom: Vec<String> = s.custom_fields.iter().map(|f| format!("{} ({})", f.label, f.key)).collect();
        println!("Custom:      {}", custom.join(", "));
    }
    println!("Entries:     {}", schema::count_entries(conn, project.id)?);
    println!("Created:     {}", project.created_at);
    Ok(())
}

fn cmd_next(conn: &Connection, selected: Option<String>) -> Result<()> {
    let project = resolve_project(conn, selected)?;
    let entries = schema::list_entries(conn, project.id)?;
    let prediction = predict_next(&project.settings, &entries);

    println!("Next entry for '{}':", project.name);
    println!();
    if let Some(ref episode) = prediction.episode {
        println!("Episode:     {}", episode);
    }
    println!("Scene:       {}", prediction.scene);
    println!("Shot:        {}", prediction.shot);
    println!("Take:        {}", prediction.take);
    if project.settings.sound_enabled() {
        println!("Sound:       {}", prediction.sound_file);
    }
    for (i, slot) in prediction.camera_files.iter().enumerate() {
        let state = if prediction.rec_active[i] { "" } else { " (not recording)" };
        println!("Camera {:<5}{}{}", format!("{}:", i + 1), slot, state);
    }
    Ok(())
}

#[derive(Default)]
struct LogInput {
    scene: Option<String>,
    shot: Option<String>,
    take: Option<String>,
    sound: Option<String>,
    cameras: Vec<String>,
    classification: String,
    waste_camera: bool,
    waste_sound: bool,
    no_speed: bool,
    mos: bool,
    inactive: Vec<usize>,
    episode: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    cards: Option<String>,
    fields: Vec<String>,
}

/// Apply typed values and the classification to a primed form
fn fill_form(mut form: EntryForm, input: LogInput) -> Result<EntryForm> {
    // A typed sound number wins over the predicted one, also when a classification sets sound
    let next_sound = input.sound.as_deref().map(parse_slot).unwrap_or(form.sound_file);

    if let Some(scene) = input.scene {
        form.scene = scene;
    }
    if let Some(shot) = input.shot {
        form.shot = shot;
    }
    if let Some(take) = input.take {
        form.take = take;
    }
    if let Some(ref sound) = input.sound {
        form.sound_file = parse_slot(sound);
    }

    let channels = form.camera_files.len();
    if input.cameras.len() > channels {
        anyhow::bail!("Project has {} camera channel(s), got {} --camera values", channels, input.cameras.len());
    }
    for (i, raw) in input.cameras.iter().enumerate() {
        form.camera_files[i] = parse_slot(raw);
    }
    for channel in input.inactive {
        if channel == 0 || channel > channels {
            anyhow::bail!("Camera channel {} does not exist (1..={})", channel, channels);
        }
        form.rec_active[channel - 1] = false;
    }

    let classification: Classification = input.classification.parse()?;
    let choice = match classification {
        Classification::Normal => None,
        Classification::Waste => {
            if !input.waste_camera && !input.waste_sound {
                anyhow::bail!("A waste take needs --waste-camera, --waste-sound or both");
            }
            Some(ClassificationChoice::Waste(WasteSelection {
                camera: input.waste_camera,
                sound: input.waste_sound,
            }))
        }
        Classification::Insert => Some(ClassificationChoice::Insert { sound_speed: !input.no_speed }),
        Classification::Ambience => Some(ClassificationChoice::Ambience),
        Classification::Sfx => Some(ClassificationChoice::Sfx),
    };
    if let Some(choice) = choice {
        form.select(choice, next_sound);
    }
    if input.mos {
        form.toggle_mos()?;
    }

    form.episode = input.episode.or(form.episode);
    form.description = input.description;
    form.notes = input.notes;
    form.card_numbers = input.cards;
    for pair in &input.fields {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Custom field must be key=value, got '{}'", pair))?;
        form.custom_values.insert(key.trim().to_lowercase(), value.to_string());
    }

    Ok(form)
}

fn cmd_log(conn: &Connection, selected: Option<String>, input: LogInput, options: CommitOptions) -> Result<()> {
    let project = resolve_project(conn, selected)?;
    let form = fill_form(prime_next_form(conn, &project)?, input)?;

    let license = licensing::check_license();
    match commit_entry(conn, &project, &license, &form, options)? {
        CommitOutcome::Created { entry, takes_shifted } => {
            if takes_shifted > 0 {
                println!("Moved {} later take(s) up by one", takes_shifted);
            }
            println!("Logged #{}: {}", entry.id, describe_entry(&entry));
        }
        CommitOutcome::Inserted { entry, renumbered } => {
            println!("Logged #{}: {}", entry.id, describe_entry(&entry));
            println!("Renumbered {} entr(ies):", renumbered.len());
            for id in renumbered {
                if let Some(moved) = schema::get_entry(conn, id)? {
                    println!("  #{}: {}", moved.id, describe_entry(&moved));
                }
            }
        }
        CommitOutcome::NeedsInsertConfirmation(target) => {
            println!("Files line up with the start of an existing take:");
            println!("  {}", target.location);
            println!();
            println!("Nothing was logged. Re-run with --insert-before to renumber that take and every later one.");
        }
    }
    Ok(())
}

fn cmd_list(conn: &Connection, selected: Option<String>, limit: usize) -> Result<()> {
    let project = resolve_project(conn, selected)?;
    let entries = schema::list_entries(conn, project.id)?;
    let total = entries.len();

    println!("Project: {} ({} entries total)", project.name, total);
    println!();

    if entries.is_empty() {
        println!("No entries found. Use 'slatelog log' to add a take.");
        return Ok(());
    }

    println!("{:>5}  {:>6}  {:>5}  {:>5}  {:>9}  {:>10}  {}", "ID", "Scene", "Shot", "Take", "Class", "Sound", "Cameras");
    println!("{}", "-".repeat(70));

    for entry in entries.iter().skip(total.saturating_sub(limit)) {
        let cameras: Vec<String> = entry
            .camera_files
            .iter()
            .enumerate()
            .map(|(i, slot)| display_slot(slot, entry.is_channel_active(i)))
            .collect();
        println!(
            "{:>5}  {:>6}  {:>5}  {:>5}  {:>9}  {:>10}  {}",
            entry.id,
            entry.scene,
            entry.shot,
            entry.take,
            entry.classification,
            if entry.mos { "MOS".to_string() } else { display_slot(&entry.sound_file, true) },
            cameras.join("  ")
        );
    }

    if total > limit {
        println!();
        println!("Showing {} of {} entries. Use --limit to see more.", limit, total);
    }

    Ok(())
}

fn cmd_license(cmd: LicenseCommand) -> Result<()> {
    match cmd {
        LicenseCommand::Status => {
            let state = licensing::check_license();
            println!("License:     {:?}", state.license_type);
            if state.is_active {
                println!("Key:         {}", state.key_hash.as_deref().unwrap_or("-"));
            } else {
                println!(
                    "Trial:       up to {} entries per project",
                    slate_log_lib::constants::TRIAL_ENTRY_LIMIT
                );
            }
        }
        LicenseCommand::Activate { key } => {
            let state = licensing::activate_key(&key)?;
            println!("Activated {:?} license", state.license_type);
        }
        LicenseCommand::Deactivate => {
            licensing::deactivate()?;
            println!("License key removed");
        }
        LicenseCommand::Generate { license_type, count } => {
            let license_type: LicenseType = license_type.parse()?;
            for _ in 0..count {
                let key = licensing::generate_key(license_type)
                    .ok_or_else(|| anyhow::anyhow!("Trial licenses have no key"))?;
                println!("{}", key);
            }
        }
    }
    Ok(())
}

// --- Helper Functions ---

fn resolve_project(conn: &Connection, name: Option<String>) -> Result<Project> {
    if let Some(name) = name {
        return schema::get_project_by_name(conn, &name)?
            .ok_or_else(|| anyhow::anyhow!("Project '{}' not found", name));
    }

    let active = settings::load_app_settings(conn)?.active_project.ok_or_else(|| {
        anyhow::anyhow!("No active project. Use 'slatelog project create <name>' or 'slatelog project use <name>'.")
    })?;
    schema::get_project(conn, active)?
        .ok_or_else(|| anyhow::anyhow!("Active project {} no longer exists", active))
}

fn display_slot(slot: &Slot, active: bool) -> String {
    match (slot.is_blank(), active) {
        (_, false) => "off".to_string(),
        (true, true) => "-".to_string(),
        (false, true) => slot.to_string(),
    }
}

fn describe_entry(entry: &LogEntry) -> String {
    let mut parts = vec![entry.location()];
    if !entry.sound_file.is_blank() {
        parts.push(format!("Sound {}", entry.sound_file));
    }
    for (i, slot) in entry.camera_files.iter().enumerate() {
        if !slot.is_blank() {
            parts.push(format!("Camera {} {}", i + 1, slot));
        }
    }
    if entry.classification != Classification::Normal {
        parts.push(format!("[{}]", entry.classification));
    }
    parts.join(", ")
}
