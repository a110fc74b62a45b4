#![deny(clippy::all, clippy::pedantic)]

use motorhub::domain::calendar::EventMonth;

use crate::args::EventsCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: EventsCmd) -> Result<(), CliError> {
    match cmd {
        EventsCmd::Month { month, year } => {
            let month = match (month, year) {
                (Some(month), Some(year)) => EventMonth::new(month, year)
                    .ok_or_else(|| CliError::InvalidInput(format!("no such month: {month}/{year}")))?,
                _ => EventMonth::current(),
            };
            let events = ctx.hub.events_for_month(month).await?;
            print_json(events.as_ref())
        }
        EventsCmd::Attend { id } => {
            ctx.signed_in().await?;
            print_json(&ctx.hub.toggle_attendance(id).await?)
        }
    }
}
