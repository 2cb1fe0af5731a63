use crate::models::{ChannelPoint, Dashboard, FilterSelection, Metrics, SalesRecord, TrendPoint};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// The channel chart always covers this many trailing days.
pub const CHANNEL_SPLIT_DAYS: i64 = 30;

pub fn build_dashboard_at(
    today: NaiveDate,
    records: &[SalesRecord],
    selection: &FilterSelection,
) -> Dashboard {
    let filtered = filter_records(today, records, selection);

    Dashboard {
        row_count: filtered.len(),
        metrics: compute_metrics(&filtered),
        trend: revenue_trend(&filtered),
        channel_split: channel_split(today, &filtered),
    }
}

pub fn cutoff(today: NaiveDate, lookback_days: i64) -> NaiveDate {
    today - Duration::days(lookback_days)
}

pub fn filter_records<'a>(
    today: NaiveDate,
    records: &'a [SalesRecord],
    selection: &FilterSelection,
) -> Vec<&'a SalesRecord> {
    let since = cutoff(today, selection.period.lookback_days());
    let channels: BTreeSet<&str> = selection.channels.iter().map(String::as_str).collect();

    records
        .iter()
        .filter(|record| record.date >= since && channels.contains(record.channel.as_str()))
        .collect()
}

pub fn compute_metrics(rows: &[&SalesRecord]) -> Metrics {
    let mut total_revenue = 0.0;
    let mut total_margin = 0.0;
    let mut total_orders = 0i64;
    for row in rows {
        total_revenue += row.revenue;
        total_margin += row.gross_margin;
        total_orders = total_orders.saturating_add(row.orders);
    }

    Metrics {
        total_revenue,
        total_orders,
        gross_margin_pct: 100.0 * total_margin / f64::max(total_revenue, 1.0),
    }
}

pub fn revenue_trend(rows: &[&SalesRecord]) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *by_date.entry(row.date).or_default() += row.revenue;
    }

    by_date
        .into_iter()
        .map(|(date, revenue)| TrendPoint {
            date: date.to_string(),
            revenue,
        })
        .collect()
}

/// Revenue per channel over the trailing window, whatever period was picked.
pub fn channel_split(today: NaiveDate, rows: &[&SalesRecord]) -> Vec<ChannelPoint> {
    let since = cutoff(today, CHANNEL_SPLIT_DAYS);
    let mut by_channel: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.date >= since) {
        *by_channel.entry(row.channel.as_str()).or_default() += row.revenue;
    }

    by_channel
        .into_iter()
        .map(|(channel, revenue)| ChannelPoint {
            channel: channel.to_string(),
            revenue,
        })
        .collect()
}

pub fn distinct_channels(records: &[SalesRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.channel.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use crate::sources::demo_records;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn selection(period: Period, channels: &[&str]) -> FilterSelection {
        FilterSelection {
            period,
            channels: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn demo_table_both_channels() {
        let records = demo_records(today());
        let dashboard =
            build_dashboard_at(today(), &records, &selection(Period::Days30, &["Store", "E-Com"]));

        assert_eq!(dashboard.row_count, 30);
        assert_eq!(dashboard.metrics.total_revenue, 600_000.0);
        assert_eq!(dashboard.metrics.total_orders, 4_500);
        assert!((dashboard.metrics.gross_margin_pct - 40.0).abs() < 1e-9);
        assert_eq!(
            dashboard.channel_split,
            vec![
                ChannelPoint { channel: "E-Com".into(), revenue: 300_000.0 },
                ChannelPoint { channel: "Store".into(), revenue: 300_000.0 },
            ]
        );
        assert_eq!(dashboard.trend.len(), 30);
    }

    #[test]
    fn demo_table_store_only() {
        let records = demo_records(today());
        let dashboard =
            build_dashboard_at(today(), &records, &selection(Period::Days30, &["Store"]));

        assert_eq!(dashboard.metrics.total_revenue, 300_000.0);
        assert!((dashboard.metrics.gross_margin_pct - 40.0).abs() < 1e-9);
        assert_eq!(dashboard.trend.len(), 15);
        assert!(dashboard.trend.iter().all(|point| point.revenue > 0.0));
    }

    #[test]
    fn empty_table_yields_zeros() {
        for period in Period::ALL {
            let dashboard = build_dashboard_at(today(), &[], &selection(period, &["Store"]));
            assert_eq!(dashboard.row_count, 0);
            assert_eq!(dashboard.metrics.total_revenue, 0.0);
            assert_eq!(dashboard.metrics.total_orders, 0);
            assert_eq!(dashboard.metrics.gross_margin_pct, 0.0);
            assert!(dashboard.trend.is_empty());
            assert!(dashboard.channel_split.is_empty());
        }
    }

    #[test]
    fn zero_revenue_margin_stays_finite() {
        let records = vec![SalesRecord::new(today(), "Store", 0.0, 3, 0.5)];
        let dashboard = build_dashboard_at(today(), &records, &selection(Period::Days30, &["Store"]));
        assert!(dashboard.metrics.gross_margin_pct.is_finite());
        assert_eq!(dashboard.metrics.gross_margin_pct, 50.0);
    }

    #[test]
    fn filter_applies_cutoff_and_channels_exactly() {
        let records = vec![
            SalesRecord::new(today() - Duration::days(90), "Store", 1.0, 1, 0.0),
            SalesRecord::new(today() - Duration::days(91), "Store", 2.0, 1, 0.0),
            SalesRecord::new(today() - Duration::days(10), "E-Com", 4.0, 1, 0.0),
            SalesRecord::new(today() - Duration::days(10), "Wholesale", 8.0, 1, 0.0),
        ];
        let picked = selection(Period::Days90, &["Store", "E-Com"]);
        let filtered = filter_records(today(), &records, &picked);

        let revenues: Vec<f64> = filtered.iter().map(|r| r.revenue).collect();
        assert_eq!(revenues, vec![1.0, 4.0]);
        let since = cutoff(today(), 90);
        assert!(filtered.iter().all(|r| r.date >= since && picked.channels.contains(&r.channel)));
    }

    #[test]
    fn channel_split_ignores_selected_period() {
        let mut records = demo_records(today());
        records.push(SalesRecord::new(today() - Duration::days(200), "Store", 999.0, 9, 1.0));
        records.push(SalesRecord::new(today() - Duration::days(45), "E-Com", 555.0, 5, 1.0));

        let channels = ["Store", "E-Com"];
        let short = build_dashboard_at(today(), &records, &selection(Period::Days30, &channels));
        let long = build_dashboard_at(today(), &records, &selection(Period::Months12, &channels));

        assert_eq!(short.channel_split, long.channel_split);
        assert!(long.metrics.total_revenue > short.metrics.total_revenue);
    }

    #[test]
    fn duplicate_dates_are_summed_in_date_order() {
        let day = today() - Duration::days(2);
        let records = vec![
            SalesRecord::new(today(), "Store", 5.0, 1, 1.0),
            SalesRecord::new(day, "Store", 1.0, 1, 1.0),
            SalesRecord::new(day, "E-Com", 2.0, 1, 1.0),
        ];
        let trend = revenue_trend(&records.iter().collect::<Vec<_>>());
        assert_eq!(
            trend,
            vec![
                TrendPoint { date: day.to_string(), revenue: 3.0 },
                TrendPoint { date: today().to_string(), revenue: 5.0 },
            ]
        );
    }

    #[test]
    fn pipeline_is_idempotent() {
        let records = demo_records(today());
        let picked = selection(Period::Days90, &["E-Com"]);
        let first = build_dashboard_at(today(), &records, &picked);
        let second = build_dashboard_at(today(), &records, &picked);
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_channels_are_sorted_and_unique() {
        let records = demo_records(today());
        assert_eq!(distinct_channels(&records), vec!["E-Com", "Store"]);
    }
}
