use crate::config::TimeBasis;
use crate::types::{
    BookingDocument, OrderAmount, Summaries, STATUS_CANCELLED, STATUS_RESCHEDULED,
};
use crate::util::month_label;
use chrono::{Datelike, Local, TimeZone, Utc};

/// Compute every dashboard summary in one pass, deriving years and months in
/// the machine's local time zone.
pub fn aggregate<'a, I>(filtered: I) -> Summaries
where
    I: IntoIterator<Item = &'a BookingDocument>,
{
    aggregate_in(filtered, &Local)
}

pub fn aggregate_with<'a, I>(filtered: I, basis: TimeBasis) -> Summaries
where
    I: IntoIterator<Item = &'a BookingDocument>,
{
    match basis {
        TimeBasis::Local => aggregate_in(filtered, &Local),
        TimeBasis::Utc => aggregate_in(filtered, &Utc),
    }
}

/// Single pass over `filtered`; the result is always a fresh value.
///
/// Profit is summed left to right in input order. Each grouping skips a
/// document only when the field it keys on is absent or unusable.
pub fn aggregate_in<'a, I, Tz>(filtered: I, tz: &Tz) -> Summaries
where
    I: IntoIterator<Item = &'a BookingDocument>,
    Tz: TimeZone,
{
    let mut out = Summaries::default();

    for doc in filtered {
        out.kpi.total_orders += 1;
        if let Some(amount) = doc.order_amount.as_ref().and_then(OrderAmount::value) {
            out.kpi.profit += amount;
        }

        if let Some(status) = doc.booking_status.as_deref() {
            match status {
                STATUS_CANCELLED => out.kpi.cancelled += 1,
                STATUS_RESCHEDULED => out.kpi.rescheduled += 1,
                _ => {}
            }
            out.by_status.increment(status);
        }

        if let Some(method) = doc.payment_method.as_deref() {
            out.by_payment.increment(method);
        }

        // No bucket at all for unparseable dates.
        if let Some(when) = doc.date_time.as_ref().and_then(|ts| ts.resolve(tz)) {
            out.by_year.increment(&when.year().to_string());
            out.by_month.increment(&month_label(&when));
        }

        if let Some(city) = doc.city.as_deref() {
            out.by_city.increment(city);
        }
    }

    out
}
