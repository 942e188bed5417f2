use std::fmt::Display;

/// Instruction mnemonics, official and unofficial, grouped by what they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    // Load/store
    LAS,
    LAX,
    LDA,
    LDX,
    LDY,
    LXA,
    SAX,
    SHA,
    SHX,
    SHY,
    STA,
    STX,
    STY,
    // Transfer
    SHS,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
    // Stack
    PHA,
    PHP,
    PLA,
    PLP,
    // Shift
    ASL,
    LSR,
    ROL,
    ROR,
    // Logic
    AND,
    BIT,
    EOR,
    ORA,
    // Arithmetic
    ADC,
    ANC,
    ARR,
    ASR,
    CMP,
    CPX,
    CPY,
    SBC,
    SBX,
    XAA,
    // Increment/decrement
    DEC,
    DEX,
    DEY,
    INC,
    INX,
    INY,
    // Combined read-modify-write + ALU
    DCP,
    ISC,
    RLA,
    RRA,
    SLO,
    SRE,
    // Control
    BRK,
    JMP,
    JSR,
    RTI,
    RTS,
    // Branch
    BCC,
    BCS,
    BEQ,
    BMI,
    BNE,
    BPL,
    BVC,
    BVS,
    // Flags
    CLC,
    CLD,
    CLI,
    CLV,
    SEC,
    SED,
    SEI,
    // Misc
    NOP,
    JAM,
}

impl Mnemonic {
    /// Opcodes whose bus output depends on analog effects. Strict mode
    /// refuses to run them.
    pub const fn is_unstable(self) -> bool {
        matches!(
            self,
            Mnemonic::SHA | Mnemonic::SHS | Mnemonic::SHX | Mnemonic::SHY | Mnemonic::JAM
        )
    }

    /// Part of the documented 6502 instruction set.
    pub const fn is_official(self) -> bool {
        !matches!(
            self,
            Mnemonic::LAS
                | Mnemonic::LAX
                | Mnemonic::LXA
                | Mnemonic::SAX
                | Mnemonic::SHA
                | Mnemonic::SHX
                | Mnemonic::SHY
                | Mnemonic::SHS
                | Mnemonic::ANC
                | Mnemonic::ARR
                | Mnemonic::ASR
                | Mnemonic::SBX
                | Mnemonic::XAA
                | Mnemonic::DCP
                | Mnemonic::ISC
                | Mnemonic::RLA
                | Mnemonic::RRA
                | Mnemonic::SLO
                | Mnemonic::SRE
                | Mnemonic::JAM
        )
    }
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
