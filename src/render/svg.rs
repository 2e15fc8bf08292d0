use maud::{Markup, html};

use super::{AvatarView, ProfileView};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

const AVATAR_SIZE: u32 = 224;
const AVATAR_INSET: u32 = 20;
const PROFILE_WIDTH: u32 = 640;
const PROFILE_HEIGHT: u32 = 570;
const PROFILE_AVATAR_OFFSET: u32 = 32;

/// 头像在内、头像框在外的两层叠加，原点为 (x, y)
fn overlay(view: &AvatarView, x: u32, y: u32) -> Markup {
    let inner = AVATAR_SIZE - 2 * AVATAR_INSET;
    html! {
        image href=(view.avatar_url) x=(x + AVATAR_INSET) y=(y + AVATAR_INSET) width=(inner) height=(inner) {}
        @if !view.frame_url.is_empty() {
            image href=(view.frame_url) x=(x) y=(y) width=(AVATAR_SIZE) height=(AVATAR_SIZE) {}
        }
    }
}

pub(super) fn avatar(view: &AvatarView) -> Markup {
    html! {
        svg xmlns=(SVG_NS) width=(AVATAR_SIZE) height=(AVATAR_SIZE) viewBox={ "0 0 " (AVATAR_SIZE) " " (AVATAR_SIZE) } {
            (overlay(view, 0, 0))
        }
    }
}

pub(super) fn profile(view: &ProfileView) -> Markup {
    html! {
        svg xmlns=(SVG_NS) width=(PROFILE_WIDTH) height=(PROFILE_HEIGHT) viewBox={ "0 0 " (PROFILE_WIDTH) " " (PROFILE_HEIGHT) } {
            foreignObject x="0" y="0" width=(PROFILE_WIDTH) height=(PROFILE_HEIGHT) {
                video xmlns=(XHTML_NS) width=(PROFILE_WIDTH) height=(PROFILE_HEIGHT) autoplay="autoplay" loop="loop" muted="muted" playsinline="playsinline" poster=(view.image_url) {
                    @if !view.webm_url.is_empty() {
                        source src=(view.webm_url) type="video/webm" {}
                    }
                    @if !view.mp4_url.is_empty() {
                        source src=(view.mp4_url) type="video/mp4" {}
                    }
                }
            }
            (overlay(&view.avatar, PROFILE_AVATAR_OFFSET, PROFILE_AVATAR_OFFSET))
        }
    }
}
