use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::models::{GroupSummary, PredictionEntry, RiskBand};

pub fn summarize_by<F>(entries: &[PredictionEntry], label: F) -> Vec<GroupSummary>
where
    F: Fn(&PredictionEntry) -> &'static str,
{
    let mut map: BTreeMap<&'static str, (usize, f64)> = BTreeMap::new();

    for entry in entries {
        let slot = map.entry(label(entry)).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += entry.cancellation_probability;
    }

    let mut summaries: Vec<GroupSummary> = map
        .into_iter()
        .map(|(label, (count, total))| GroupSummary {
            label: label.to_string(),
            count,
            avg_probability: if count == 0 {
                0.0
            } else {
                total / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(seed: Option<u64>, entries: &[PredictionEntry]) -> String {
    let by_hotel = summarize_by(entries, |e| e.hotel.as_str());
    let by_deposit = summarize_by(entries, |e| e.deposit_type.as_str());
    let by_band = summarize_by(entries, |e| {
        RiskBand::from_probability(e.cancellation_probability).as_str()
    });

    let mut output = String::new();
    let seed_label = seed.map_or_else(|| "random seed".to_string(), |s| format!("seed {s}"));

    let _ = writeln!(output, "# Booking Cancellation Sample Report");
    let _ = writeln!(
        output,
        "Scored {} synthetic bookings ({})",
        entries.len(),
        seed_label
    );

    if entries.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No bookings scored.");
        return output;
    }

    let mean = entries
        .iter()
        .map(|e| e.cancellation_probability)
        .sum::<f64>()
        / entries.len() as f64;
    let _ = writeln!(output, "Mean cancellation probability {mean:.4}");

    for (heading, summaries) in [
        ("Risk Bands", &by_band),
        ("By Hotel Type", &by_hotel),
        ("By Deposit Type", &by_deposit),
    ] {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {heading}");
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} bookings (avg probability {:.4})",
                summary.label, summary.count, summary.avg_probability
            );
        }
    }

    let mut riskiest = entries.to_vec();
    riskiest.sort_by(|a, b| {
        b.cancellation_probability
            .partial_cmp(&a.cancellation_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Bookings");

    for entry in riskiest.iter().take(5) {
        let _ = writeln!(
            output,
            "- #{} {} ({}, {}) lead time {} days, probability {:.4}",
            entry.sequence,
            entry.hotel,
            entry.market_segment,
            entry.deposit_type,
            entry.lead_time,
            entry.cancellation_probability
        );
    }

    output
}

#[derive(Serialize)]
struct SampleRow<'a> {
    sequence: u64,
    booking_id: String,
    hotel: &'a str,
    lead_time: u32,
    adr: f64,
    deposit_type: &'a str,
    market_segment: &'a str,
    customer_type: &'a str,
    adults: u32,
    cancellation_probability: f64,
}

pub fn write_csv<W: std::io::Write>(out: W, entries: &[PredictionEntry]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for entry in entries {
        writer.serialize(SampleRow {
            sequence: entry.sequence,
            booking_id: entry.booking_id.to_string(),
            hotel: entry.hotel.as_str(),
            lead_time: entry.lead_time,
            adr: entry.adr,
            deposit_type: entry.deposit_type.as_str(),
            market_segment: entry.market_segment.as_str(),
            customer_type: entry.customer_type.as_str(),
            adults: entry.adults,
            cancellation_probability: entry.cancellation_probability,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{minimum_record, DepositType, Hotel};
    use chrono::Utc;

    fn entry(sequence: u64, hotel: Hotel, deposit: DepositType, probability: f64) -> PredictionEntry {
        let mut record = minimum_record();
        record.hotel = hotel;
        record.deposit_type = deposit;
        PredictionEntry::new(sequence, &record, None, probability, Utc::now())
    }

    #[test]
    fn groups_average_probability() {
        let entries = vec![
            entry(1, Hotel::City, DepositType::NoDeposit, 0.2),
            entry(2, Hotel::City, DepositType::NonRefund, 0.6),
            entry(3, Hotel::Resort, DepositType::NoDeposit, 0.5),
        ];
        let summaries = summarize_by(&entries, |e| e.hotel.as_str());
        assert_eq!(summaries[0].label, "City Hotel");
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_probability - 0.4).abs() < 1e-9);
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn report_lists_riskiest_first() {
        let entries = vec![
            entry(1, Hotel::City, DepositType::NoDeposit, 0.2),
            entry(2, Hotel::Resort, DepositType::NonRefund, 0.9),
        ];
        let report = build_report(Some(42), &entries);
        assert!(report.contains("Scored 2 synthetic bookings (seed 42)"));
        assert!(report.contains("Mean cancellation probability 0.5500"));
        let riskiest = report.split("## Highest Risk Bookings").nth(1).unwrap();
        assert!(riskiest.find("#2").unwrap() < riskiest.find("#1").unwrap());
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(None, &[]);
        assert!(report.contains("No bookings scored."));
    }

    #[test]
    fn csv_has_one_row_per_entry() {
        let entries = vec![entry(1, Hotel::City, DepositType::Refundable, 0.3)];
        let mut out = Vec::new();
        write_csv(&mut out, &entries).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("sequence,booking_id,hotel"));
        assert!(lines[1].contains("City Hotel,0,50.0,Refundable"));
    }
}
