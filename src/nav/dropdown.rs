//! Open/closed tracking for nav dropdown menus.
//!
//! At most one menu is open at a time. While a menu is open an outside-click
//! listener is armed; it is disarmed as soon as it fires or the menu closes.

#[cfg(test)]
#[path = "dropdown_test.rs"]
mod dropdown_test;

/// What changed as the result of one dropdown operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropdownChange {
    pub opened: Option<String>,
    pub closed: Option<String>,
}

impl DropdownChange {
    pub fn is_empty(&self) -> bool {
        self.opened.is_none() && self.closed.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropdownState {
    open: Option<String>,
}

impl DropdownState {
    pub fn open_menu(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn is_open(&self, menu: &str) -> bool {
        self.open.as_deref() == Some(menu)
    }

    /// The outside-click listener is armed exactly while a menu is open.
    pub fn listener_armed(&self) -> bool {
        self.open.is_some()
    }

    /// Flip `menu`. Opening it closes whichever menu was open before.
    pub fn toggle(&mut self, menu: &str) -> DropdownChange {
        if self.is_open(menu) {
            return self.close_all();
        }
        let closed = self.open.replace(menu.to_owned());
        DropdownChange { opened: Some(menu.to_owned()), closed }
    }

    pub fn close_all(&mut self) -> DropdownChange {
        DropdownChange { opened: None, closed: self.open.take() }
    }

    /// A click landed outside every open menu.
    pub fn outside_click(&mut self) -> DropdownChange {
        self.close_all()
    }
}
