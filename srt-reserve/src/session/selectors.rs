//! SRT booking site URLs and DOM selectors.
//!
//! These belong to the website, not to us. When the site changes its
//! markup this is the file to update.

pub const LOGIN_URL: &str = "https://etk.srail.kr/cmc/01/selectLoginForm.do";
pub const SEARCH_URL: &str = "https://etk.srail.kr/hpg/hra/01/selectScheduleList.do";

pub const LOGIN_ID_FIELD: &str = "#srchDvNm01";
pub const LOGIN_PASSWORD_FIELD: &str = "#hmpgPwdCphd01";
pub const LOGIN_SUBMIT: &str = "#login-form > fieldset > div:nth-of-type(1) > div:nth-of-type(1) \
     > div:nth-of-type(2) > div > div:nth-of-type(2) > input";

/// Header area that greets a logged-in member.
pub const WELCOME_AREA: &str = "#wrap > div.header.header-e > div.global.clear > div";
pub const WELCOME_TEXT: &str = "환영합니다";

pub const DEPARTURE_FIELD: &str = "#dptRsStnCdNm";
pub const ARRIVAL_FIELD: &str = "#arvRsStnCdNm";
pub const DATE_SELECT: &str = "#dptDt";
pub const HOUR_SELECT: &str = "#dptTm";
pub const SEARCH_SUBMIT: &str = "input[value='조회하기']";

const RESULT_BODY: &str = "#result-form > fieldset > div.tbl_wrap.th_thead > table > tbody";

/// Result table column holding the standard-seat action.
pub const SEAT_COLUMN: usize = 7;
/// Result table column holding the wait-list action.
pub const WAITLIST_COLUMN: usize = 8;

/// Shown on the page reached after a successful reservation.
pub const CONFIRMATION_MARKER: &str = "#isFalseGotoMain";

/// A cell of the result table. Rows and columns are 1-based.
pub fn result_cell(row: usize, column: usize) -> String {
    format!("{RESULT_BODY} > tr:nth-child({row}) > td:nth-child({column})")
}

/// The clickable action inside a result cell.
pub fn result_action(row: usize, column: usize) -> String {
    format!("{} > a", result_cell(row, column))
}

/// Present once the result table has rendered.
pub fn results_ready() -> String {
    result_cell(1, SEAT_COLUMN)
}
