use std::time::Duration;

use bevy::prelude::*;

use crate::controller::{MenuController, MenuIntent};

/// Raw viewport width report, one per platform resize event.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ViewportResized {
    pub width: f32,
}

/// Raw vertical scroll offset report.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct PageScrolled {
    pub offset: f32,
}

/// Trailing-edge debounce: the last value pushed is released once the
/// window elapses without another push.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    timer: Timer,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        let mut timer = Timer::new(window, TimerMode::Once);
        timer.pause();
        Self {
            timer,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some(value);
        self.timer.reset();
        self.timer.unpause();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn tick(&mut self, delta: Duration) -> Option<T> {
        if self.pending.is_none() {
            return None;
        }
        self.timer.tick(delta);
        if !self.timer.just_finished() {
            return None;
        }
        self.timer.pause();
        self.pending.take()
    }
}

#[derive(Resource, Debug, Clone)]
pub struct ResizeDebounce(pub Debouncer<f32>);

#[derive(Resource, Debug, Clone)]
pub struct ScrollDebounce(pub Debouncer<f32>);

impl FromWorld for ResizeDebounce {
    fn from_world(world: &mut World) -> Self {
        let window = world
            .get_resource::<MenuController>()
            .map(|controller| controller.config().resize_debounce())
            .unwrap_or(Duration::from_millis(250));
        Self(Debouncer::new(window))
    }
}

impl FromWorld for ScrollDebounce {
    fn from_world(world: &mut World) -> Self {
        let window = world
            .get_resource::<MenuController>()
            .map(|controller| controller.config().scroll_debounce())
            .unwrap_or(Duration::from_millis(10));
        Self(Debouncer::new(window))
    }
}

pub(super) fn debounce_viewport_and_scroll(
    mut resized: MessageReader<ViewportResized>,
    mut scrolled: MessageReader<PageScrolled>,
    time: Res<Time>,
    mut resize_debounce: ResMut<ResizeDebounce>,
    mut scroll_debounce: ResMut<ScrollDebounce>,
    mut intents: MessageWriter<MenuIntent>,
) {
    if let Some(resize) = resized.read().last() {
        resize_debounce.0.push(resize.width);
    }
    if let Some(scroll) = scrolled.read().last() {
        scroll_debounce.0.push(scroll.offset);
    }

    if let Some(width) = resize_debounce.0.tick(time.delta()) {
        intents.write(MenuIntent::ViewportResized { width });
    }
    if let Some(offset) = scroll_debounce.0.tick(time.delta()) {
        intents.write(MenuIntent::Scrolled { offset });
    }
}
