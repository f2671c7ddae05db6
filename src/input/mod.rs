use bevy::prelude::*;
use crate::dialogue::DialoguePlayer;
use crate::shared::*;

/// Which keys mean what right now.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputContext {
    #[default]
    Disabled,
    /// Serving: digit keys hand over catalog items.
    Shop,
    /// A dialogue is on screen: digit keys pick choices.
    Dialogue,
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputContext>()
            .init_resource::<KeyBindings>()
            .init_resource::<ShopInput>();
        app.add_systems(
            PreUpdate,
            (manage_input_context, reset_and_read_input).chain(),
        );
    }
}

const DIGITS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

fn first_digit(keys: &ButtonInput<KeyCode>) -> Option<usize> {
    DIGITS.iter().position(|key| keys.just_pressed(*key))
}

/// The single point where hardware input becomes shop actions.
#[allow(clippy::too_many_arguments)]
fn reset_and_read_input(
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<KeyBindings>,
    context: Res<InputContext>,
    catalog: Res<ItemCatalog>,
    mut input: ResMut<ShopInput>,
    mut serve: EventWriter<ServeEvent>,
    mut start_day: EventWriter<StartDayRequest>,
    mut next_customer: EventWriter<AdvanceCustomerRequest>,
) {
    *input = ShopInput::default();

    if *context == InputContext::Disabled {
        return;
    }

    if keys.just_pressed(bindings.debug_start_day) {
        start_day.send(StartDayRequest);
    }
    if keys.just_pressed(bindings.debug_next_customer) {
        next_customer.send(AdvanceCustomerRequest);
    }

    match *context {
        InputContext::Disabled => {}

        InputContext::Dialogue => {
            input.continue_pressed = keys.just_pressed(bindings.advance_dialogue)
                || keys.just_pressed(bindings.advance_dialogue_alt);
            input.choice = first_digit(&keys);
        }

        InputContext::Shop => {
            if let Some(item) = first_digit(&keys).and_then(|i| catalog.items.get(i)) {
                serve.send(ServeEvent {
                    item_id: item.id.clone(),
                });
            }
        }
    }
}

/// Derives InputContext from the game state and the dialogue player.
fn manage_input_context(
    game_state: Res<State<GameState>>,
    player: Res<DialoguePlayer>,
    mut context: ResMut<InputContext>,
) {
    *context = match *game_state.get() {
        GameState::Loading => InputContext::Disabled,
        GameState::Playing if player.is_playing() => InputContext::Dialogue,
        GameState::Playing => InputContext::Shop,
    };
}
