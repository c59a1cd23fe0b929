//! Current-month state kept in the navigation query string.
//!
//! A `YYYY-MM` value is always anchored on day 2 of its month so that
//! converting it to a date never rolls back into the previous month.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Local, Months, NaiveDate};
use tracing::warn;
use url::Url;

use crate::error::Error;

pub const MONTH_PARAM: &str = "month";
pub const DASHBOARD_PATH: &str = "/dashboard";

const ANCHOR_DAY: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Month, Error> {
        if (0..=9999).contains(&year)
            && NaiveDate::from_ymd_opt(year, month, ANCHOR_DAY).is_some()
        {
            Ok(Month { year, month })
        } else {
            Err(Error::InvalidMonth(format!("{}-{}", year, month)))
        }
    }

    pub fn from_date<D: Datelike>(date: &D) -> Month {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar month of the local clock.
    pub fn current() -> Month {
        Month::from_date(&Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn anchor_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, ANCHOR_DAY)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(&self) -> Month {
        self.anchor_date()
            .checked_add_months(Months::new(1))
            .map_or(*self, |date| Month::from_date(&date))
    }

    pub fn pred(&self) -> Month {
        self.anchor_date()
            .checked_sub_months(Months::new(1))
            .map_or(*self, |date| Month::from_date(&date))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(value.to_owned());
        let bytes = value.as_bytes();

        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }

        let (year, month) = (&value[..4], &value[5..]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }
}

/// Navigation-state collaborator holding the current route and its query.
pub trait Navigator {
    fn search_param(&self, name: &str) -> Option<String>;

    fn search_params(&self) -> Vec<(String, String)>;

    fn push(&mut self, path: &str, params: &[(String, String)]);
}

/// `Navigator` over an absolute URL with a push history.
#[derive(Debug, Clone)]
pub struct UrlNavigator {
    current: Url,
    history: Vec<Url>,
}

impl UrlNavigator {
    pub fn new(url: Url) -> Self {
        UrlNavigator {
            current: url,
            history: vec![],
        }
    }

    pub fn parse(url: &str) -> Result<Self, Error> {
        Ok(UrlNavigator::new(Url::parse(url)?))
    }

    pub fn current(&self) -> &Url {
        &self.current
    }

    pub fn history(&self) -> &[Url] {
        &self.history
    }
}

impl Navigator for UrlNavigator {
    fn search_param(&self, name: &str) -> Option<String> {
        self.current
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn search_params(&self) -> Vec<(String, String)> {
        self.current
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn push(&mut self, path: &str, params: &[(String, String)]) {
        let mut next = self.current.clone();
        next.set_path(path);
        next.set_query(None);
        if !params.is_empty() {
            next.query_pairs_mut().extend_pairs(params);
        }

        let previous = std::mem::replace(&mut self.current, next);
        self.history.push(previous);
    }
}

pub struct MonthState<N> {
    navigator: N,
    today: NaiveDate,
}

impl<N: Navigator> MonthState<N> {
    pub fn new(navigator: N) -> Self {
        MonthState::with_today(navigator, Local::now().date_naive())
    }

    pub fn with_today(navigator: N, today: NaiveDate) -> Self {
        MonthState { navigator, today }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    fn month_param(&self) -> Option<Month> {
        let value = self.navigator.search_param(MONTH_PARAM)?;
        match value.parse::<Month>() {
            Ok(month) => Some(month),
            Err(e) => {
                warn!("Ignoring month param: {}", e);
                None
            },
        }
    }

    /// Date the selected month stands for: day 2 of the `month` param,
    /// or today when the param is absent.
    pub fn current_date(&self) -> NaiveDate {
        self.month_param()
            .map_or(self.today, |month| month.anchor_date())
    }

    pub fn current_month(&self) -> Month {
        Month::from_date(&self.current_date())
    }

    pub fn set_month<D: Datelike>(&mut self, date: &D) -> Month {
        let month = Month::from_date(date);
        let mut params: Vec<(String, String)> = self
            .navigator
            .search_params()
            .into_iter()
            .filter(|(key, _)| key != MONTH_PARAM)
            .collect();
        params.push((MONTH_PARAM.to_owned(), month.to_string()));

        self.navigator.push(DASHBOARD_PATH, &params);
        month
    }

    pub fn next_month(&mut self) -> Month {
        let date = self.current_date();
        let next = date.checked_add_months(Months::new(1)).unwrap_or(date);
        self.set_month(&next)
    }

    pub fn prev_month(&mut self) -> Month {
        let date = self.current_date();
        let prev = date.checked_sub_months(Months::new(1)).unwrap_or(date);
        self.set_month(&prev)
    }
}
