#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    CWD,
    CDUP,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    RETR,
    STOR,
    APPE,
    LIST,
    NLST,
    TYPE,
    MODE,
    PORT,
    EPRT,
    PASV,
    EPSV,
    FEAT,
    SYST,
    NOOP,
    OPTS,
    AUTH,
    PROT,
    PBSZ,
}

impl FtpCommand {
    /// Matches the verb case-insensitively.
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "MKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "TYPE" => Some(FtpCommand::TYPE),
            "MODE" => Some(FtpCommand::MODE),
            "PORT" => Some(FtpCommand::PORT),
            "EPRT" => Some(FtpCommand::EPRT),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            "FEAT" => Some(FtpCommand::FEAT),
            "SYST" => Some(FtpCommand::SYST),
            "NOOP" => Some(FtpCommand::NOOP),
            "OPTS" => Some(FtpCommand::OPTS),
            "AUTH" => Some(FtpCommand::AUTH),
            "PROT" => Some(FtpCommand::PROT),
            "PBSZ" => Some(FtpCommand::PBSZ),
            _ => None,
        }
    }

    /// Commands that touch the file provider need a logged-in user.
    pub fn requires_auth(self) -> bool {
        matches!(
            self,
            FtpCommand::PWD
                | FtpCommand::CWD
                | FtpCommand::CDUP
                | FtpCommand::MKD
                | FtpCommand::RMD
                | FtpCommand::DELE
                | FtpCommand::RNFR
                | FtpCommand::RNTO
                | FtpCommand::RETR
                | FtpCommand::STOR
                | FtpCommand::APPE
                | FtpCommand::LIST
                | FtpCommand::NLST
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert_eq!(FtpCommand::from_str("user"), Some(FtpCommand::USER));
        assert_eq!(FtpCommand::from_str("ePsV"), Some(FtpCommand::EPSV));
        assert_eq!(FtpCommand::from_str("SITE"), None);
        assert_eq!(FtpCommand::from_str(""), None);
    }

    #[test]
    fn test_authentication_gate() {
        assert!(FtpCommand::PWD.requires_auth());
        assert!(FtpCommand::NLST.requires_auth());
        assert!(!FtpCommand::PASV.requires_auth());
        assert!(!FtpCommand::AUTH.requires_auth());
        assert!(!FtpCommand::QUIT.requires_auth());
    }
}
