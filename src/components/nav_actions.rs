//! Nav actions region: guest links, or role links plus the user dropdown.
//!
//! DESIGN
//! ======
//! The component only draws a `NavView`; which links exist and whether the
//! menu is open are decided by the navigation controller. User interaction
//! is reported back through a `NavHandle`.

use leptos::prelude::*;

use crate::nav::controller::NavHandle;
use crate::nav::view::{MenuAction, MenuItem, NavLink, NavView, USER_MENU, UserNav};

#[component]
pub fn NavActions(
    nav: RwSignal<NavView>,
    open_menu: RwSignal<Option<String>>,
    actions: StoredValue<NavHandle, LocalStorage>,
) -> impl IntoView {
    move || match nav.get() {
        NavView::Guest { links } => view! {
            <div class="nav-actions__guest">{link_views(&links, "btn btn--ghost")}</div>
        }
        .into_any(),
        NavView::Authenticated(user) => view! {
            <UserActions user=user open_menu=open_menu actions=actions/>
        }
        .into_any(),
    }
}

#[component]
fn UserActions(
    user: UserNav,
    open_menu: RwSignal<Option<String>>,
    actions: StoredValue<NavHandle, LocalStorage>,
) -> impl IntoView {
    let UserNav { initial, display_name, links, menu, .. } = user;
    let is_open = move || open_menu.get().as_deref() == Some(USER_MENU);

    let on_toggle = move |ev: leptos::ev::MouseEvent| {
        // Keep this click from reaching the outside-click listener it arms.
        ev.stop_propagation();
        actions.get_value().toggle_menu(USER_MENU);
    };

    let items = menu
        .into_iter()
        .map(|item| menu_item_view(item, actions))
        .collect::<Vec<_>>();

    view! {
        <nav class="nav-links">{link_views(&links, "nav-link")}</nav>
        <div class=move || if is_open() { "nav-dropdown nav-dropdown--open" } else { "nav-dropdown" }>
            <button
                class="nav-dropdown__toggle"
                aria-haspopup="true"
                aria-expanded=move || is_open().to_string()
                on:click=on_toggle
            >
                <span class="nav-avatar">{initial}</span>
                <span class="nav-user">{display_name}</span>
            </button>
            <div class="nav-dropdown__menu">{items}</div>
        </div>
    }
}

fn link_views(links: &[NavLink], class: &'static str) -> Vec<AnyView> {
    links
        .iter()
        .map(|link| view! { <a href=link.href class=class>{link.label}</a> }.into_any())
        .collect()
}

fn menu_item_view(item: MenuItem, actions: StoredValue<NavHandle, LocalStorage>) -> AnyView {
    match item.action {
        MenuAction::Navigate(href) => view! {
            <a href=href class="nav-dropdown__item">{item.label}</a>
        }
        .into_any(),
        MenuAction::Logout => view! {
            <button
                class="nav-dropdown__item nav-dropdown__item--danger"
                on:click=move |_| actions.get_value().logout()
            >
                {item.label}
            </button>
        }
        .into_any(),
    }
}
