//! Markup the lightbox expects on the page.
//!
//! The gallery never builds its overlay at runtime; it attaches to markup the
//! page already carries (see [`ModalSurface::anchors_ready`]). These renderers
//! produce that markup with maud, plus a pre-rendered modal for a single
//! project and a full portfolio page for previews.
//!
//! [`ModalSurface::anchors_ready`]: crate::platform::ModalSurface::anchors_ready

use crate::config::LazyConfig;
use crate::placeholder;
use crate::types::{Project, ProjectCatalog};
use maud::{DOCTYPE, Markup, html};

pub const MODAL_ID: &str = "gallery-modal";
pub const MAIN_IMAGE_ID: &str = "gallery-main-image";
pub const THUMBNAILS_ID: &str = "gallery-thumbnails";
pub const COUNTER_ID: &str = "gallery-counter";
/// Attribute carrying the project id on activatable elements.
pub const PROJECT_ATTR: &str = "data-project-id";

/// Empty overlay with every anchor the gallery looks for.
pub fn modal_shell() -> Markup {
    html! {
        div.gallery-modal id=(MODAL_ID) role="dialog" aria-modal="true"
            aria-labelledby="gallery-title" hidden {
            div.gallery-backdrop {}
            div.gallery-content {
                header.gallery-header {
                    h2 id="gallery-title" {}
                    span.gallery-type {}
                    button.gallery-close type="button" aria-label="Close gallery" { "×" }
                }
                div.gallery-stage {
                    button.gallery-prev type="button" aria-label="Previous image" { "‹" }
                    img.gallery-main id=(MAIN_IMAGE_ID) tabindex="0" alt="";
                    button.gallery-next type="button" aria-label="Next image" { "›" }
                }
                p.gallery-counter id=(COUNTER_ID) aria-live="polite" {}
                div.gallery-thumbnails id=(THUMBNAILS_ID) role="list" {}
            }
        }
    }
}

/// Thumbnail buttons, with generated placeholders until the lazy loader fills them.
pub fn thumbnail_strip(images: &[String], active: usize, lazy: &LazyConfig) -> Markup {
    let filler = placeholder::loading_placeholder(lazy.placeholder_width, lazy.placeholder_height);
    html! {
        @for (idx, src) in images.iter().enumerate() {
            button.gallery-thumb.active[idx == active] type="button" role="listitem"
                data-index=(idx) aria-current=[(idx == active).then_some("true")] {
                img src=(filler) data-src=(src) alt={ "Thumbnail " (idx + 1) } loading="lazy";
            }
        }
    }
}

/// The modal as it looks right after `project` opens.
pub fn project_modal(project: &Project, lazy: &LazyConfig) -> Markup {
    let images = project.ordered_images();
    let total = images.len();
    html! {
        div.gallery-modal.open id=(MODAL_ID) role="dialog" aria-modal="true"
            aria-labelledby="gallery-title" {
            div.gallery-backdrop {}
            div.gallery-content {
                header.gallery-header {
                    h2 id="gallery-title" { (project.name) }
                    span.gallery-type { (project.project_type.label()) }
                    button.gallery-close type="button" aria-label="Close gallery" { "×" }
                }
                div.gallery-stage {
                    button.gallery-prev type="button" aria-label="Previous image"
                        disabled[total < 2] { "‹" }
                    @if let Some(first) = images.first() {
                        img.gallery-main id=(MAIN_IMAGE_ID) tabindex="0" src=(first)
                            alt={ (project.name) ", image 1 of " (total) };
                    } @else {
                        img.gallery-main id=(MAIN_IMAGE_ID) tabindex="0" alt="";
                    }
                    button.gallery-next type="button" aria-label="Next image"
                        disabled[total < 2] { "›" }
                }
                p.gallery-counter id=(COUNTER_ID) aria-live="polite" {
                    @if total > 0 { "1 / " (total) }
                }
                div.gallery-thumbnails id=(THUMBNAILS_ID) role="list" {
                    (thumbnail_strip(&images, 0, lazy))
                }
            }
        }
    }
}

/// A portfolio grid card that opens its project when activated.
pub fn project_card(project: &Project) -> Markup {
    let cover = project.ordered_images().into_iter().next();
    html! {
        article.project-card data-project-id=(project.id) tabindex="0" role="button" {
            @if let Some(cover) = cover {
                img src=(cover) alt=(project.name) loading="lazy";
            }
            h3 { (project.name) }
            p.project-type { (project.project_type.label()) }
        }
    }
}

/// Standalone preview page: every project card plus the empty modal shell.
pub fn portfolio_page(catalog: &ProjectCatalog) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Portfolio" }
            }
            body {
                main.portfolio {
                    div.project-grid {
                        @for project in catalog.iter() {
                            (project_card(project))
                        }
                    }
                }
                (modal_shell())
            }
        }
    }
}
