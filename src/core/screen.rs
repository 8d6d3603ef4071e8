//! Screen identifiers for every UI mode

/// Exactly one screen is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    MainMenu,
    CallParameterList,
    CallParameterEdit,
    CallTypeEdit,
    CallExecuting,
    CallResult,
    CallHistory,
    CallHistoryDetail,
    LogDetail,
    Contracts,
    ContractDetail,
    ConfirmReset,
    Dashboard,
    AccountsList,
    AccountDetail,
    BlocksList,
    BlockDetail,
    TransactionsList,
    TransactionDetail,
    StateInspector,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 21] = [
        Screen::MainMenu,
        Screen::CallParameterList,
        Screen::CallParameterEdit,
        Screen::CallTypeEdit,
        Screen::CallExecuting,
        Screen::CallResult,
        Screen::CallHistory,
        Screen::CallHistoryDetail,
        Screen::LogDetail,
        Screen::Contracts,
        Screen::ContractDetail,
        Screen::ConfirmReset,
        Screen::Dashboard,
        Screen::AccountsList,
        Screen::AccountDetail,
        Screen::BlocksList,
        Screen::BlockDetail,
        Screen::TransactionsList,
        Screen::TransactionDetail,
        Screen::StateInspector,
        Screen::Settings,
    ];

    /// Explorer tabs, in Tab-key order.
    pub const TABS: [Screen; 6] = [
        Screen::Dashboard,
        Screen::AccountsList,
        Screen::BlocksList,
        Screen::TransactionsList,
        Screen::StateInspector,
        Screen::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::MainMenu => "Main Menu",
            Screen::CallParameterList => "Call Parameters",
            Screen::CallParameterEdit => "Edit Parameter",
            Screen::CallTypeEdit => "Call Type",
            Screen::CallExecuting => "Executing",
            Screen::CallResult => "Call Result",
            Screen::CallHistory => "Call History",
            Screen::CallHistoryDetail => "History Entry",
            Screen::LogDetail => "Log",
            Screen::Contracts => "Contracts",
            Screen::ContractDetail => "Contract",
            Screen::ConfirmReset => "Reset State",
            Screen::Dashboard => "Dashboard",
            Screen::AccountsList => "Accounts",
            Screen::AccountDetail => "Account",
            Screen::BlocksList => "Blocks",
            Screen::BlockDetail => "Block",
            Screen::TransactionsList => "Transactions",
            Screen::TransactionDetail => "Transaction",
            Screen::StateInspector => "Inspector",
            Screen::Settings => "Settings",
        }
    }

    /// The explorer tab this screen belongs to, if any.
    pub fn tab(&self) -> Option<Screen> {
        match self {
            Screen::Dashboard => Some(Screen::Dashboard),
            Screen::AccountsList | Screen::AccountDetail => Some(Screen::AccountsList),
            Screen::BlocksList | Screen::BlockDetail => Some(Screen::BlocksList),
            Screen::TransactionsList | Screen::TransactionDetail => {
                Some(Screen::TransactionsList)
            }
            Screen::StateInspector => Some(Screen::StateInspector),
            Screen::Settings => Some(Screen::Settings),
            _ => None,
        }
    }

    /// Next (or previous) explorer tab, wrapping around.
    pub fn cycle_tab(&self, forward: bool) -> Screen {
        let current = self.tab().unwrap_or(Screen::Dashboard);
        let idx = Self::TABS
            .iter()
            .position(|tab| *tab == current)
            .unwrap_or(0);
        let len = Self::TABS.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::TABS[next]
    }

    /// Screens that own a free-text buffer. Plain characters are typed, not bound.
    pub fn captures_text(&self) -> bool {
        matches!(self, Screen::CallParameterEdit | Screen::StateInspector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_tab_wraps() {
        assert_eq!(Screen::Settings.cycle_tab(true), Screen::Dashboard);
        assert_eq!(Screen::Dashboard.cycle_tab(false), Screen::Settings);
        assert_eq!(Screen::BlockDetail.cycle_tab(true), Screen::TransactionsList);
    }

    #[test]
    fn test_non_tab_screen_cycles_from_dashboard() {
        assert_eq!(Screen::MainMenu.cycle_tab(true), Screen::AccountsList);
    }
}
