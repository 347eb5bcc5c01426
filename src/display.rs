use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use clap::ValueEnum;
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::history::RollingHistory;
use crate::models::{PredictionEntry, RiskBand};

pub const TITLE: &str = "📊 Hotel Booking Cancellation Predictor";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Named placeholders on the screen, painted top to bottom in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Banner,
    Clock,
    Latest,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionUpdate {
    pub region: Region,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HistoryFormat {
    #[default]
    Table,
    Csv,
}

/// Issues region updates to the renderer without waiting on the terminal.
#[derive(Debug, Clone)]
pub struct DisplayDriver {
    tx: UnboundedSender<RegionUpdate>,
    show_history: bool,
    history_format: HistoryFormat,
}

impl DisplayDriver {
    pub fn new(
        tx: UnboundedSender<RegionUpdate>,
        show_history: bool,
        history_format: HistoryFormat,
    ) -> Self {
        Self {
            tx,
            show_history,
            history_format,
        }
    }

    /// Returns false once the renderer has gone away.
    pub fn replace(&self, region: Region, content: String) -> bool {
        match self.tx.send(RegionUpdate { region, content }) {
            Ok(()) => true,
            Err(_) => {
                debug!(?region, "renderer closed, dropping update");
                false
            }
        }
    }

    pub fn render_banner(&self, banner: Option<&Path>) {
        self.replace(Region::Banner, format_banner(banner));
    }

    pub fn render_latest(&self, entry: &PredictionEntry) {
        self.replace(Region::Latest, format_latest(entry));
    }

    pub fn render_history(&self, history: &RollingHistory) {
        if !self.show_history {
            return;
        }
        let content = match self.history_format {
            HistoryFormat::Table => format_history_table(history),
            HistoryFormat::Csv => match format_history_csv(history) {
                Ok(csv) => csv,
                Err(err) => {
                    warn!(error = %err, "failed to encode history as csv");
                    format_history_table(history)
                }
            },
        };
        self.replace(Region::History, content);
    }

    pub fn render_clock<Tz: TimeZone>(&self, now: DateTime<Tz>) -> bool
    where
        Tz::Offset: std::fmt::Display,
    {
        self.replace(Region::Clock, format_clock(now))
    }
}

pub fn format_banner(banner: Option<&Path>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{TITLE}");
    if let Some(path) = banner {
        if path.exists() {
            let _ = writeln!(output, "[banner: {}]", path.display());
        } else {
            warn!(path = %path.display(), "banner asset not found");
        }
    }
    let _ = writeln!(
        output,
        "🔄 Simulating incoming bookings and predicting their cancellation probability."
    );
    output
}

pub fn format_clock<Tz: TimeZone>(now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("🕒 {}", now.format("%Y-%m-%d %H:%M:%S"))
}

pub fn format_latest(entry: &PredictionEntry) -> String {
    let mut output = String::new();
    let timestamp = entry.timestamp.with_timezone(&Local);

    let _ = writeln!(
        output,
        "🔔 New booking #{} ({})",
        entry.sequence,
        timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(output, "  Booking ID:   {}", entry.booking_id);
    if let Some(guest) = &entry.guest {
        let _ = writeln!(output, "  Guest:        {} ({})", guest.name, guest.gender);
        let _ = writeln!(output, "  Contact:      {} / {}", guest.email, guest.phone);
    }
    let _ = writeln!(output, "  Hotel Type:   {}", entry.hotel);
    let _ = writeln!(output, "  Lead Time:    {} days", entry.lead_time);
    let _ = writeln!(output, "  ADR:          {:.0}", entry.adr);
    let _ = writeln!(output, "  Deposit:      {}", entry.deposit_type);
    let _ = writeln!(output, "  Segment:      {}", entry.market_segment);
    let _ = writeln!(output, "  Customer:     {}", entry.customer_type);
    let _ = writeln!(output, "  Adults:       {}", entry.adults);
    let _ = writeln!(
        output,
        "  Cancellation probability: {:.4} ({} risk)",
        entry.cancellation_probability,
        RiskBand::from_probability(entry.cancellation_probability).as_str()
    );
    output
}

pub fn format_history_table(history: &RollingHistory) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "📈 Recent Predictions");

    if history.is_empty() {
        let _ = writeln!(output, "No predictions yet.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>4}  {:<8}  {:<12}  {:>9}  {:>4}  {:<10}  {:>11}",
        "#", "Time", "Hotel Type", "Lead Time", "ADR", "Deposit", "Probability"
    );
    for entry in history.iter() {
        let _ = writeln!(
            output,
            "{:>4}  {:<8}  {:<12}  {:>9}  {:>4.0}  {:<10}  {:>11.4}",
            entry.sequence,
            entry.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            entry.hotel.as_str(),
            entry.lead_time,
            entry.adr,
            entry.deposit_type.as_str(),
            entry.cancellation_probability
        );
    }
    output
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    sequence: u64,
    timestamp: String,
    #[serde(rename = "Hotel Type")]
    hotel: &'a str,
    lead_time: u32,
    adr: f64,
    deposit_type: &'a str,
    cancellation_probability: f64,
}

pub fn format_history_csv(history: &RollingHistory) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in history.iter() {
        writer.serialize(HistoryRow {
            sequence: entry.sequence,
            timestamp: entry.timestamp.to_rfc3339(),
            hotel: entry.hotel.as_str(),
            lead_time: entry.lead_time,
            adr: entry.adr,
            deposit_type: entry.deposit_type.as_str(),
            cancellation_probability: entry.cancellation_probability,
        })?;
    }
    let bytes = writer.into_inner().map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Holds the current contents of every region and repaints the full frame.
pub struct Screen<W: Write> {
    out: W,
    regions: BTreeMap<Region, String>,
    clear: bool,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self {
            out,
            regions: BTreeMap::new(),
            clear,
        }
    }

    pub fn apply(&mut self, update: RegionUpdate) -> io::Result<()> {
        self.regions.insert(update.region, update.content);
        self.paint()
    }

    pub fn frame(&self) -> String {
        let mut frame = String::new();
        for content in self.regions.values() {
            frame.push_str(content);
            if !content.ends_with('\n') {
                frame.push('\n');
            }
            frame.push('\n');
        }
        frame
    }

    fn paint(&mut self) -> io::Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        let frame = self.frame();
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Drains region updates until every driver is dropped.
pub async fn run_renderer<W: Write>(
    mut rx: UnboundedReceiver<RegionUpdate>,
    mut screen: Screen<W>,
) -> Screen<W> {
    while let Some(update) = rx.recv().await {
        if let Err(err) = screen.apply(update) {
            warn!(error = %err, "failed to paint screen, stopping renderer");
            break;
        }
    }
    screen
}
