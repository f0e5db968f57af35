//! Case-link strategy: last resort, any anchor whose text names a case.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::link::caption_near;
use super::text::element_text;
use super::{PageContext, Strategy, StrategyKind};
use crate::types::candidate::Candidate;

const DATE_DEPTH: usize = 6;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Treats the target of any anchor whose text carries a case number as
/// the opinion document, whatever the href looks like.
pub struct CaseLinkStrategy;

impl Strategy for CaseLinkStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CaseLink
    }

    fn candidates<'a>(
        &'a self,
        document: &'a Html,
        ctx: &'a PageContext,
    ) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        Box::new(document.select(&LINK).filter_map(move |link| {
            let text = element_text(link);
            let case_number = ctx.find_case_number(&text)?;
            let href = link.value().attr("href")?;

            Some(Candidate {
                case_name: caption_near(link, &text, &case_number),
                date_filed: ctx.date_near(link, DATE_DEPTH),
                document_url: ctx.resolve(href),
                case_number,
                ..Default::default()
            })
        }))
    }
}
