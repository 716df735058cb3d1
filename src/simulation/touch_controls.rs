//! On-screen driving pad for touch screens.
//!
//! Narrow windows get four buttons above the bottom edge. Every active touch
//! is hit-tested against them, so a thumb on the throttle and one on the
//! steering both count.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::vehicle::ControlInput;

pub struct TouchControlsPlugin;

impl Plugin for TouchControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TouchControlsConfig>()
            .add_systems(Startup, spawn_touch_pad)
            .add_systems(Update, layout_touch_pad);
    }
}

#[derive(Resource, Clone, Debug)]
pub struct TouchControlsConfig {
    /// The pad is shown on windows at most this wide (logical pixels).
    pub max_window_width: f32,
    pub button_size: f32,
    pub gap: f32,
    pub bottom_margin: f32,
}

impl Default for TouchControlsConfig {
    fn default() -> Self {
        Self {
            max_window_width: 768.0,
            button_size: 56.0,
            gap: 10.0,
            bottom_margin: 30.0,
        }
    }
}

impl TouchControlsConfig {
    pub fn active(&self, window_width: f32) -> bool {
        window_width <= self.max_window_width
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchButton {
    Forward,
    Backward,
    Left,
    Right,
}

impl TouchButton {
    pub const ALL: [TouchButton; 4] = [
        TouchButton::Forward,
        TouchButton::Backward,
        TouchButton::Left,
        TouchButton::Right,
    ];

    fn label(self) -> &'static str {
        match self {
            TouchButton::Forward => "^",
            TouchButton::Backward => "v",
            TouchButton::Left => "<",
            TouchButton::Right => ">",
        }
    }

    fn press(self, input: &mut ControlInput) {
        match self {
            TouchButton::Forward => input.forward = true,
            TouchButton::Backward => input.backward = true,
            TouchButton::Left => input.left = true,
            TouchButton::Right => input.right = true,
        }
    }

    /// Screen rectangle of the button in logical pixels, origin top-left.
    ///
    /// Backward sits on the bottom row, left and right above it, forward on
    /// top, all centred horizontally.
    pub fn rect(self, window: Vec2, config: &TouchControlsConfig) -> Rect {
        let size = config.button_size;
        let center_x = window.x / 2.0;
        let row_top = |row: f32| window.y - config.bottom_margin - size - row * (size + config.gap);
        let (x, y) = match self {
            TouchButton::Backward => (center_x - size / 2.0, row_top(0.0)),
            TouchButton::Left => (center_x - config.gap / 2.0 - size, row_top(1.0)),
            TouchButton::Right => (center_x + config.gap / 2.0, row_top(1.0)),
            TouchButton::Forward => (center_x - size / 2.0, row_top(2.0)),
        };
        Rect::new(x, y, x + size, y + size)
    }
}

/// Controls held by touches at `positions` in a window of size `window`.
pub fn control_from_touches(
    positions: impl IntoIterator<Item = Vec2>,
    window: Vec2,
    config: &TouchControlsConfig,
) -> ControlInput {
    let mut input = ControlInput::default();
    if !config.active(window.x) {
        return input;
    }
    for position in positions {
        for button in TouchButton::ALL {
            if button.rect(window, config).contains(position) {
                button.press(&mut input);
            }
        }
    }
    input
}

const BUTTON_BG: Color = Color::srgba(1.0, 1.0, 1.0, 0.8);
const BUTTON_BORDER: Color = Color::srgb(0.8, 0.8, 0.8);
const LABEL_COLOR: Color = Color::srgb(0.15, 0.15, 0.15);

fn spawn_touch_pad(mut commands: Commands) {
    for button in TouchButton::ALL {
        commands
            .spawn((
                Node {
                    position_type: PositionType::Absolute,
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    border: UiRect::all(Val::Px(1.0)),
                    ..default()
                },
                BackgroundColor(BUTTON_BG),
                BorderColor(BUTTON_BORDER),
                BorderRadius::all(Val::Px(10.0)),
                Visibility::Hidden,
                button,
            ))
            .with_children(|parent| {
                parent.spawn((
                    Text::new(button.label()),
                    TextFont {
                        font_size: 20.0,
                        ..default()
                    },
                    TextColor(LABEL_COLOR),
                ));
            });
    }
}

fn layout_touch_pad(
    config: Res<TouchControlsConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut buttons: Query<(&TouchButton, &mut Node, &mut Visibility)>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let size = window.size();
    let shown = config.active(size.x);

    for (button, mut node, mut visibility) in &mut buttons {
        let wanted = if shown {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *visibility != wanted {
            *visibility = wanted;
        }
        if !shown {
            continue;
        }
        let rect = button.rect(size, &config);
        node.left = Val::Px(rect.min.x);
        node.top = Val::Px(rect.min.y);
        node.width = Val::Px(rect.width());
        node.height = Val::Px(rect.height());
    }
}
