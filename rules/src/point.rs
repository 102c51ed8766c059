use bitflags::bitflags;

bitflags! {
    /// Where in the accept/inspect pipeline a rule (or the fetch its
    /// condition depends on) may run. The parser rejects a condition whose
    /// fetches share no bit with the rule list's evaluation point.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EvalPoint: u32 {
        /// connection accept, before any session state exists
        const FE_CON_ACC = 0x01;
        /// session accept, e.g. after the PROXY protocol header
        const FE_SES_ACC = 0x02;
        /// request-channel content inspection
        const FE_REQ_CNT = 0x04;
        /// response-channel content inspection
        const FE_RES_CNT = 0x08;
    }
}
