use bevy::prelude::*;
use crate::customers::CustomerManager;
use crate::scoring::{format_gold, ShopScore};
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS: used to query and update HUD elements
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct HudDayText;

#[derive(Component)]
pub struct HudOrderText;

#[derive(Component)]
pub struct HudGoldText;

#[derive(Component)]
pub struct HudHpText;

// ═══════════════════════════════════════════════════════════════════════
// SPAWN HUD
// ═══════════════════════════════════════════════════════════════════════

fn hud_text(marker: impl Component, initial: &str, size: f32, color: Color) -> impl Bundle {
    (
        marker,
        Text::new(initial),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
        PickingBehavior::IGNORE,
    )
}

pub fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Px(44.0),
                position_type: PositionType::Absolute,
                top: Val::Px(0.0),
                flex_direction: FlexDirection::Row,
                justify_content: JustifyContent::SpaceBetween,
                align_items: AlignItems::Center,
                padding: UiRect::axes(Val::Px(12.0), Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
            // The HUD must not block serve-tray clicks.
            PickingBehavior::IGNORE,
        ))
        .with_children(|top_bar| {
            top_bar.spawn(hud_text(HudDayText, "Day -", 18.0, Color::WHITE));
            top_bar.spawn(hud_text(
                HudOrderText,
                "",
                16.0,
                Color::srgb(0.8, 0.85, 1.0),
            ));
            top_bar
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Row,
                        align_items: AlignItems::Center,
                        column_gap: Val::Px(16.0),
                        ..default()
                    },
                    PickingBehavior::IGNORE,
                ))
                .with_children(|right| {
                    right.spawn(hud_text(
                        HudGoldText,
                        "0g",
                        18.0,
                        Color::srgb(1.0, 0.84, 0.0),
                    ));
                    right.spawn(hud_text(
                        HudHpText,
                        "",
                        18.0,
                        Color::srgb(1.0, 0.45, 0.45),
                    ));
                });
        });
}

// ═══════════════════════════════════════════════════════════════════════
// UPDATE SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn update_day_display(
    manager: Res<CustomerManager>,
    mut query: Query<&mut Text, With<HudDayText>>,
) {
    if !manager.is_changed() {
        return;
    }
    let schedule = manager.schedule();
    let line = format!(
        "Day {}  ({} of {} customers left)",
        manager.day(),
        schedule.remaining(),
        schedule.roster().len()
    );
    for mut text in &mut query {
        **text = line.clone();
    }
}

pub fn update_order_display(
    manager: Res<CustomerManager>,
    catalog: Res<ItemCatalog>,
    mut query: Query<&mut Text, With<HudOrderText>>,
) {
    if !manager.is_changed() {
        return;
    }
    let line = match manager.current_customer() {
        Some(customer) => format!(
            "{} wants {} (misses {}/{})",
            customer.name,
            catalog.display_name(&customer.requested_item),
            customer.fail_count,
            customer.max_fails
        ),
        None => String::new(),
    };
    for mut text in &mut query {
        **text = line.clone();
    }
}

#[allow(clippy::type_complexity)]
pub fn update_score_display(
    score: Res<ShopScore>,
    mut gold_query: Query<&mut Text, With<HudGoldText>>,
    mut hp_query: Query<&mut Text, (With<HudHpText>, Without<HudGoldText>)>,
) {
    if !score.is_changed() {
        return;
    }
    for mut text in &mut gold_query {
        **text = format_gold(score.gold);
    }
    for mut text in &mut hp_query {
        **text = format!("HP {}", score.hp);
    }
}
