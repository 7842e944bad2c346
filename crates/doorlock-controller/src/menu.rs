//! Paged menu shown after a successful authentication.
//!
//! The catalog is fixed and ordered. It is split into pages of
//! [`MENU_PAGE_SIZE`] entries that scroll automatically. The menu tracks
//! two timers: `last_scroll` drives autoscroll, `last_activity` drives the
//! idle timeout. Only key presses count as activity.

use doorlock_core::constants::{MENU_PAGE_SIZE, MENU_TITLE};
use doorlock_hardware::{Key, Screen};
use std::{fmt, time::Duration};
use tokio::time::Instant;

/// An entry of the menu catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    OpenDoor,
    ChangePassword,
    AddFingerprint,
    Exit,
}

impl MenuAction {
    /// Catalog in display order.
    pub const CATALOG: [MenuAction; 4] = [
        MenuAction::OpenDoor,
        MenuAction::ChangePassword,
        MenuAction::AddFingerprint,
        MenuAction::Exit,
    ];

    /// Key character that runs this action.
    pub fn selector(&self) -> char {
        match self {
            MenuAction::OpenDoor => '1',
            MenuAction::ChangePassword => '2',
            MenuAction::AddFingerprint => '3',
            MenuAction::Exit => '4',
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MenuAction::OpenDoor => "1:OpenDoor",
            MenuAction::ChangePassword => "2:ChangePass",
            MenuAction::AddFingerprint => "3:AddFinger",
            MenuAction::Exit => "4:Exit",
        }
    }

    /// Find the action selected by `key`, if any.
    ///
    /// ```
    /// use doorlock_controller::MenuAction;
    /// use doorlock_hardware::Key;
    ///
    /// assert_eq!(MenuAction::from_key(Key::Digit(3)), Some(MenuAction::AddFingerprint));
    /// assert_eq!(MenuAction::from_key(Key::Digit(5)), None);
    /// assert_eq!(MenuAction::from_key(Key::Hash), None);
    /// ```
    pub fn from_key(key: Key) -> Option<Self> {
        let c = key.as_char();
        Self::CATALOG.into_iter().find(|action| action.selector() == c)
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Number of pages the catalog spans.
pub fn page_count() -> usize {
    MenuAction::CATALOG.len().div_ceil(MENU_PAGE_SIZE)
}

/// Render one page: the title line then up to three action titles.
pub fn page_screen(page: usize) -> Screen {
    let start = page * MENU_PAGE_SIZE;
    MenuAction::CATALOG
        .iter()
        .skip(start)
        .take(MENU_PAGE_SIZE)
        .enumerate()
        .fold(Screen::message(MENU_TITLE), |screen, (i, action)| {
            screen.with_line(i + 1, action.title())
        })
}

/// Page position and timers of an open menu.
#[derive(Debug, Clone)]
pub struct Menu {
    page: usize,
    last_activity: Instant,
    last_scroll: Instant,
    scroll_interval: Duration,
    idle_timeout: Duration,
}

impl Menu {
    pub fn new(scroll_interval: Duration, idle_timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            page: 0,
            last_activity: now,
            last_scroll: now,
            scroll_interval,
            idle_timeout,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Back to page 0 with both timers restarted.
    pub fn reset(&mut self, now: Instant) {
        self.page = 0;
        self.last_activity = now;
        self.last_scroll = now;
    }

    /// Record a key press.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Advance to the next page if the scroll interval has elapsed.
    ///
    /// Returns the new page when it changed.
    pub fn tick_scroll(&mut self, now: Instant) -> Option<usize> {
        if now.duration_since(self.last_scroll) < self.scroll_interval {
            return None;
        }
        self.page = (self.page + 1) % page_count();
        self.last_scroll = now;
        Some(self.page)
    }

    pub fn idle_expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_activity) >= self.idle_timeout
    }
}
