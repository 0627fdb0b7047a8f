//! Site content handlers: salary guides, career and press articles,
//! carousel slides, resources.

use serde_json::json;
use tabled::Tabled;

use edujobs_core::{CarouselSlide, ContentItem, ContentKind, JobBoard};

use crate::cli::{ContentArgs, ContentCommand, GlobalOpts};
use crate::error::CliError;
use crate::{feedback, output};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ContentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Published")]
    published: String,
}

impl From<&ContentItem> for ContentRow {
    fn from(c: &ContentItem) -> Self {
        Self {
            id: c.id.clone(),
            title: c.title.clone(),
            slug: c.slug.clone().unwrap_or_default(),
            published: output::short_date(c.published_at.as_ref()),
        }
    }
}

#[derive(Tabled)]
struct SlideRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "#")]
    order: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Image")]
    image: String,
}

impl From<&CarouselSlide> for SlideRow {
    fn from(s: &CarouselSlide) -> Self {
        Self {
            id: s.id.clone(),
            order: s.order.map(|o| o.to_string()).unwrap_or_default(),
            title: s.title.clone().unwrap_or_default(),
            image: s.image_url.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    board: &JobBoard,
    args: ContentArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = args.kind;
    match args.command {
        ContentCommand::List if kind == ContentKind::CarouselSlides => {
            let slides = board.carousel_slides().await?;
            let out = output::render_list(
                &global.output,
                &slides,
                |s| SlideRow::from(s),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ContentCommand::List => {
            let items = board.content(kind).await?;
            let out = output::render_list(
                &global.output,
                &items,
                |c| ContentRow::from(c),
                |c| c.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ContentCommand::Get { id } => {
            let id = util::require_id("ID", &id)?;
            let item = board.query(&kind.get_endpoint(), &json!({ "id": id })).await?;
            output::print_output(&output::render_value(&global.output, &item), global.quiet);
            Ok(())
        }

        ContentCommand::Create { from_file } => {
            let body = util::read_json_file(&from_file)?;
            let created = board.mutate(&kind.create_endpoint(), &body).await?;
            feedback::success_or(global, util::server_message(&created), "Created");
            output::print_output(&output::render_value(&global.output, &created), global.quiet);
            Ok(())
        }

        ContentCommand::Update { id, from_file } => {
            let id = util::require_id("ID", &id)?;
            let body = util::with_id(util::read_json_file(&from_file)?, id)?;
            let updated = board.mutate(&kind.update_endpoint(), &body).await?;
            feedback::success_or(global, util::server_message(&updated), "Updated");
            Ok(())
        }

        ContentCommand::Delete { id } => {
            let id = util::require_id("ID", &id)?;
            if !util::confirm(&format!("Delete {kind} item '{id}'?"), global.yes)? {
                return Ok(());
            }
            let result = if kind == ContentKind::CarouselSlides {
                board.delete_carousel_slide(id).await?
            } else {
                board
                    .mutate(&kind.delete_endpoint(), &json!({ "id": id }))
                    .await?
            };
            feedback::success_or(global, util::server_message(&result), "Deleted");
            Ok(())
        }
    }
}
