mod shared;
mod story;
mod dialogue;
mod customers;
mod scoring;
mod input;
mod ui;
mod data;

use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use shared::*;

const CONFIG_FILE: &str = "kedai.ron";
const CONFIG_ENV: &str = "KEDAI_CONFIG";

/// Where the config came from, logged once logging is up.
#[derive(Resource)]
struct ConfigReport(Result<Option<String>, String>);

/// `KEDAI_CONFIG` wins over `kedai.ron`; neither present means defaults.
fn load_config() -> (ShopConfig, ConfigReport) {
    let (path, explicit) = match std::env::var(CONFIG_ENV) {
        Ok(path) => (path, true),
        Err(_) => (CONFIG_FILE.to_string(), false),
    };
    if !explicit && !std::path::Path::new(&path).exists() {
        return (ShopConfig::default(), ConfigReport(Ok(None)));
    }
    match ShopConfig::load(&path) {
        Ok(config) => (config, ConfigReport(Ok(Some(path)))),
        Err(err) => (
            ShopConfig::default(),
            ConfigReport(Err(format!("could not load {}: {}", path, err))),
        ),
    }
}

fn log_config_report(report: Res<ConfigReport>) {
    match &report.0 {
        Ok(Some(path)) => info!("[Config] Loaded {}", path),
        Ok(None) => info!("[Config] No {} found; using defaults", CONFIG_FILE),
        Err(err) => warn!("[Config] {}. Using defaults.", err),
    }
}

fn main() {
    let (config, report) = load_config();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Kedai".into(),
                        resolution: WindowResolution::new(960.0, 640.0),
                        present_mode: PresentMode::AutoVsync,
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        // Game state
        .init_state::<GameState>()
        // Shared resources
        .insert_resource(config)
        .insert_resource(report)
        .init_resource::<ShopRng>()
        .init_resource::<KeyBindings>()
        .init_resource::<ShopInput>()
        // Events
        .add_event::<ServeEvent>()
        .add_event::<StartDayRequest>()
        .add_event::<AdvanceCustomerRequest>()
        .add_event::<DayStartedEvent>()
        .add_event::<DayEndedEvent>()
        .add_event::<CustomerArrivedEvent>()
        .add_event::<CustomerLeftEvent>()
        .add_event::<CustomerSpeechEvent>()
        .add_event::<ReactionEvent>()
        // Frame order
        .configure_sets(
            Update,
            (
                ShopSet::Input,
                ShopSet::Dialogue,
                ShopSet::Serve,
                ShopSet::Orchestrate,
                ShopSet::Effects,
                ShopSet::Scoring,
            )
                .chain(),
        )
        // Domain plugins
        .add_plugins(input::InputPlugin)
        .add_plugins(dialogue::DialoguePlugin)
        .add_plugins(customers::CustomerPlugin)
        .add_plugins(scoring::ScoringPlugin)
        .add_plugins(ui::UiPlugin)
        // Data loading
        .add_plugins(data::DataPlugin)
        // Camera
        .add_systems(Startup, (setup_camera, log_config_report))
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
