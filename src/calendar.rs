use rustc_hash::FxHashMap;

use chrono::{Datelike, NaiveDate};

use gtfs_tables::{CalendarDate, Exception};

/// Resolved number of active days per `service_id`
pub type ServiceDays = FxHashMap<String, u32>;

#[derive(Debug, Clone)]
pub struct Service {
    pub id: String,
    /// Indexed from Monday
    pub weekdays: [bool; 7],

    // Inclusive on both ends
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Service {
    /// `None` when the row has no usable date range
    pub fn from_row(f: &gtfs_tables::Calendar) -> Option<Self> {
        Some(Service {
            id: f.id.clone(),
            weekdays: f.weekdays(),
            start_date: f.start_date?,
            end_date: f.end_date?,
        })
    }

    pub fn runs_on_date(&self, date: NaiveDate) -> bool {
        self.weekdays[date.weekday().num_days_from_monday() as usize]
    }

    fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }
}

#[derive(Debug, Default)]
pub struct CalendarExceptionList(FxHashMap<NaiveDate, Exception>);

impl CalendarExceptionList {
    fn runs_on_date(&self, date: NaiveDate) -> Option<bool> {
        self.0.get(&date).map(|exc| *exc == Exception::Added)
    }

    fn added_days(&self) -> u32 {
        self.0.values().filter(|e| **e == Exception::Added).count() as u32
    }
}

/// Counts the days a service runs.
///
/// With a weekly rule, every date of the rule's own range is visited and an exception on
/// that date overrides the weekday flag. The range of the rule is used, not the one of the
/// whole feed: a service that only runs during the first month of a year-long feed is not
/// penalised for the remaining months.
///
/// Without a rule, the service runs exactly on its `Added` dates.
pub fn resolve_active_days(
    service: Option<&Service>,
    exceptions: Option<&CalendarExceptionList>,
) -> u32 {
    match service {
        Some(service) => service
            .dates()
            .filter(|date| {
                exceptions
                    .and_then(|exc| exc.runs_on_date(*date))
                    .unwrap_or_else(|| service.runs_on_date(*date))
            })
            .count() as u32,
        None => exceptions.map(|exc| exc.added_days()).unwrap_or(0),
    }
}

#[derive(Debug, Default)]
pub struct Calendar {
    pub services: FxHashMap<String, Service>,
    pub exceptions: FxHashMap<String, CalendarExceptionList>,
}

impl Calendar {
    pub fn parse(calendar: &[gtfs_tables::Calendar], exceptions_list: &[CalendarDate]) -> Self {
        let mut services = FxHashMap::default();
        for row in calendar {
            match Service::from_row(row) {
                Some(service) => {
                    services.insert(service.id.clone(), service);
                }
                None => log::debug!("Ignoring calendar row {row}: no valid date range"),
            }
        }

        let mut exceptions: FxHashMap<String, CalendarExceptionList> = FxHashMap::default();
        for exc in exceptions_list {
            let Some(date) = exc.date else {
                continue;
            };
            exceptions
                .entry(exc.service_id.clone())
                .or_default()
                .0
                .insert(date, exc.exception_type);
        }

        Self {
            services,
            exceptions,
        }
    }

    pub fn active_days_for(&self, service_id: &str) -> u32 {
        resolve_active_days(
            self.services.get(service_id),
            self.exceptions.get(service_id),
        )
    }

    /// Active days of every service known through `calendar.txt` or `calendar_dates.txt`
    pub fn active_days(&self) -> ServiceDays {
        self.services
            .keys()
            .chain(self.exceptions.keys())
            .map(|id| (id.clone(), self.active_days_for(id)))
            .collect()
    }
}
