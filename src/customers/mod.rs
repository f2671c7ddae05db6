//! Customer domain: the day roster, the customer at the counter and the
//! orchestrator state machine that ties them to the dialogue player.
//!
//! Cross-domain traffic goes through `crate::shared` events. The manager
//! itself never touches the ECS; systems here translate.

use bevy::prelude::*;
use crate::dialogue::DialoguePlayer;
use crate::shared::*;
use crate::story::StoryLibrary;

pub mod customer;
pub mod fade;
pub mod manager;
pub mod schedule;

pub use customer::{Customer, CustomerVisual};
pub use fade::{apply_fade, tick_fades, Fade, Fadeable};
pub use manager::{
    CustomerManager, CustomerState, ServeIgnored, ServeOutcome, ShopContext, ShopEffect,
};
pub use schedule::DaySchedule;

pub struct CustomerPlugin;

impl Plugin for CustomerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CustomerManager>()
            .init_resource::<ShopRng>();

        app.add_systems(OnEnter(GameState::Playing), request_first_day);

        app.add_systems(
            Update,
            (
                handle_serve_events.in_set(ShopSet::Serve),
                tick_customer_manager.in_set(ShopSet::Orchestrate),
                flush_shop_effects.in_set(ShopSet::Effects),
            )
                .run_if(in_state(GameState::Playing)),
        );

        // Fades run for anything carrying a `Fade`, customers and toasts alike.
        app.add_systems(
            Update,
            (
                tick_fades,
                apply_fade::<Sprite>,
                apply_fade::<BackgroundColor>,
                apply_fade::<TextColor>,
            )
                .chain()
                .after(ShopSet::Effects),
        );
    }
}

/// System: open the shop as soon as data is in.
pub fn request_first_day(mut writer: EventWriter<StartDayRequest>) {
    writer.send(StartDayRequest);
}

/// System: validate this tick's serve events. At most one gets through.
pub fn handle_serve_events(
    mut events: EventReader<ServeEvent>,
    config: Res<ShopConfig>,
    mut manager: ResMut<CustomerManager>,
) {
    manager.begin_tick();
    for event in events.read() {
        let outcome = manager.handle_serve(&event.item_id, &config);
        debug!("[Customers] Serve '{}' -> {:?}", event.item_id, outcome);
    }
}

/// System: external requests first, then one orchestrator tick.
#[allow(clippy::too_many_arguments)]
pub fn tick_customer_manager(
    time: Res<Time>,
    mut start_requests: EventReader<StartDayRequest>,
    mut advance_requests: EventReader<AdvanceCustomerRequest>,
    config: Res<ShopConfig>,
    profiles: Res<ProfileStore>,
    catalog: Res<ItemCatalog>,
    stories: Res<StoryLibrary>,
    mut dialogue: ResMut<DialoguePlayer>,
    mut rng: ResMut<ShopRng>,
    mut manager: ResMut<CustomerManager>,
) {
    let mut ctx = ShopContext {
        config: &config,
        profiles: &profiles,
        catalog: &catalog,
        stories: &*stories,
        dialogue: &mut dialogue,
    };
    let rng = &mut rng.0;

    for _ in start_requests.read() {
        manager.start_day(&mut ctx, rng);
    }
    for _ in advance_requests.read() {
        manager.advance_to_next_customer(&mut ctx, rng);
    }
    manager.tick(time.delta(), &mut ctx, rng);
}

/// System: turn orchestrator effects into entities and shared events.
#[allow(clippy::too_many_arguments)]
pub fn flush_shop_effects(
    mut commands: Commands,
    config: Res<ShopConfig>,
    mut manager: ResMut<CustomerManager>,
    mut current_visual: Local<Option<Entity>>,
    mut fades: Query<&mut Fade>,
    mut day_started: EventWriter<DayStartedEvent>,
    mut day_ended: EventWriter<DayEndedEvent>,
    mut arrived: EventWriter<CustomerArrivedEvent>,
    mut left: EventWriter<CustomerLeftEvent>,
    mut speech: EventWriter<CustomerSpeechEvent>,
    mut reactions: EventWriter<ReactionEvent>,
) {
    for effect in manager.drain_effects() {
        match effect {
            ShopEffect::DayStarted { day, customers } => {
                day_started.send(DayStartedEvent { day, customers });
            }
            ShopEffect::DayEnded { day } => {
                day_ended.send(DayEndedEvent { day });
            }
            ShopEffect::CustomerArrived {
                profile_id,
                name,
                portrait,
                requested_item,
            } => {
                if let Some(stale) = current_visual.take() {
                    dismiss_visual(&mut commands, &mut fades, stale, config.fade_secs);
                }
                let entity = commands
                    .spawn((
                        CustomerVisual {
                            profile_id: profile_id.clone(),
                            name: name.clone(),
                            portrait,
                        },
                        Fade::fade_in(config.fade_secs),
                        Transform::from_xyz(0.0, 40.0, 1.0),
                    ))
                    .id();
                *current_visual = Some(entity);
                arrived.send(CustomerArrivedEvent {
                    profile_id,
                    name,
                    requested_item,
                });
            }
            ShopEffect::Speech {
                speaker,
                text,
                secs,
            } => {
                speech.send(CustomerSpeechEvent {
                    speaker,
                    text,
                    duration_secs: secs,
                });
            }
            ShopEffect::CustomerLeft {
                profile_id,
                name,
                served,
            } => {
                if let Some(entity) = current_visual.take() {
                    dismiss_visual(&mut commands, &mut fades, entity, config.fade_secs);
                }
                left.send(CustomerLeftEvent {
                    profile_id,
                    name,
                    served,
                });
            }
            ShopEffect::Reacted {
                profile_id,
                name,
                reaction,
                tags,
            } => {
                reactions.send(ReactionEvent {
                    profile_id,
                    name,
                    reaction,
                    tags,
                });
            }
        }
    }
}

/// Schedules a fade-out. The orchestrator does not wait for it.
fn dismiss_visual(commands: &mut Commands, fades: &mut Query<&mut Fade>, entity: Entity, secs: f32) {
    if let Ok(mut fade) = fades.get_mut(entity) {
        fade.fade_out(secs);
    } else if let Some(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.insert(Fade::departing(secs));
    }
}
