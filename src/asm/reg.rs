use std::fmt::Display;

/// A general-purpose register, addressed through one of its four sizes.
/// `to_sized` selects the alias matching a given byte width, mirroring the
/// way the System V calling convention reuses one physical register under
/// different names depending on the operand size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Rax,
    Eax,
    Ax,
    Al,
    Rbx,
    Ebx,
    Bx,
    Bl,
    Rcx,
    Ecx,
    Cx,
    Cl,
    Rdx,
    Edx,
    Dx,
    Dl,
    Rsi,
    Esi,
    Si,
    Sil,
    Rdi,
    Edi,
    Di,
    Dil,
    Rbp,
    Rsp,
    R8,
    R8d,
    R8w,
    R8b,
    R9,
    R9d,
    R9w,
    R9b,
    R10,
    R10d,
    R10w,
    R10b,
    R11,
    R11d,
    R11w,
    R11b,
    R12,
    R12d,
    R12w,
    R12b,
    R13,
    R13d,
    R13w,
    R13b,
    R14,
    R14d,
    R14w,
    R14b,
    R15,
    R15d,
    R15w,
    R15b,
    Xmm(u8),
}

/// Family identifier shared by all four sizes of one physical register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegFamily {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    Rbp,
    Rsp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    Xmm(u8),
}

/// The six System V argument-passing GPRs, in order.
pub const ARG_GPRS: [RegFamily; 6] = [
    RegFamily::Rdi,
    RegFamily::Rsi,
    RegFamily::Rdx,
    RegFamily::Rcx,
    RegFamily::R8,
    RegFamily::R9,
];

/// Caller-save-only general purpose pool usable as scratch by the lifetime
/// allocator, excluding `rsp`/`rbp` which anchor the frame.
pub const GPR_POOL: [RegFamily; 13] = [
    RegFamily::Rbx,
    RegFamily::R12,
    RegFamily::R13,
    RegFamily::R14,
    RegFamily::R15,
    RegFamily::Rdi,
    RegFamily::Rsi,
    RegFamily::Rdx,
    RegFamily::Rcx,
    RegFamily::R8,
    RegFamily::R9,
    RegFamily::Rax,
    RegFamily::R10,
];

pub const FPR_POOL_SIZE: usize = 8;

impl RegFamily {
    pub fn to_sized(self, bytes: usize) -> Reg {
        use Reg::*;
        match (self, bytes) {
            (RegFamily::Rax, 8) => Rax,
            (RegFamily::Rax, 4) => Eax,
            (RegFamily::Rax, 2) => Ax,
            (RegFamily::Rax, 1) => Al,
            (RegFamily::Rbx, 8) => Rbx,
            (RegFamily::Rbx, 4) => Ebx,
            (RegFamily::Rbx, 2) => Bx,
            (RegFamily::Rbx, 1) => Bl,
            (RegFamily::Rcx, 8) => Rcx,
            (RegFamily::Rcx, 4) => Ecx,
            (RegFamily::Rcx, 2) => Cx,
            (RegFamily::Rcx, 1) => Cl,
            (RegFamily::Rdx, 8) => Rdx,
            (RegFamily::Rdx, 4) => Edx,
            (RegFamily::Rdx, 2) => Dx,
            (RegFamily::Rdx, 1) => Dl,
            (RegFamily::Rsi, 8) => Rsi,
            (RegFamily::Rsi, 4) => Esi,
            (RegFamily::Rsi, 2) => Si,
            (RegFamily::Rsi, 1) => Sil,
            (RegFamily::Rdi, 8) => Rdi,
            (RegFamily::Rdi, 4) => Edi,
            (RegFamily::Rdi, 2) => Di,
            (RegFamily::Rdi, 1) => Dil,
            (RegFamily::Rbp, _) => Rbp,
            (RegFamily::Rsp, _) => Rsp,
            (RegFamily::R8, 8) => R8,
            (RegFamily::R8, 4) => R8d,
            (RegFamily::R8, 2) => R8w,
            (RegFamily::R8, 1) => R8b,
            (RegFamily::R9, 8) => R9,
            (RegFamily::R9, 4) => R9d,
            (RegFamily::R9, 2) => R9w,
            (RegFamily::R9, 1) => R9b,
            (RegFamily::R10, 8) => R10,
            (RegFamily::R10, 4) => R10d,
            (RegFamily::R10, 2) => R10w,
            (RegFamily::R10, 1) => R10b,
            (RegFamily::R11, 8) => R11,
            (RegFamily::R11, 4) => R11d,
            (RegFamily::R11, 2) => R11w,
            (RegFamily::R11, 1) => R11b,
            (RegFamily::R12, 8) => R12,
            (RegFamily::R12, 4) => R12d,
            (RegFamily::R12, 2) => R12w,
            (RegFamily::R12, 1) => R12b,
            (RegFamily::R13, 8) => R13,
            (RegFamily::R13, 4) => R13d,
            (RegFamily::R13, 2) => R13w,
            (RegFamily::R13, 1) => R13b,
            (RegFamily::R14, 8) => R14,
            (RegFamily::R14, 4) => R14d,
            (RegFamily::R14, 2) => R14w,
            (RegFamily::R14, 1) => R14b,
            (RegFamily::R15, 8) => R15,
            (RegFamily::R15, 4) => R15d,
            (RegFamily::R15, 2) => R15w,
            (RegFamily::R15, 1) => R15b,
            (RegFamily::Xmm(n), _) => Xmm(n),
            (_, other) => unimplemented!("unsupported operand width {other}"),
        }
    }
}

impl Reg {
    pub fn to_sized(self, bytes: usize) -> Reg {
        self.family().to_sized(bytes)
    }

    pub fn family(self) -> RegFamily {
        use Reg::*;
        match self {
            Rax | Eax | Ax | Al => RegFamily::Rax,
            Rbx | Ebx | Bx | Bl => RegFamily::Rbx,
            Rcx | Ecx | Cx | Cl => RegFamily::Rcx,
            Rdx | Edx | Dx | Dl => RegFamily::Rdx,
            Rsi | Esi | Si | Sil => RegFamily::Rsi,
            Rdi | Edi | Di | Dil => RegFamily::Rdi,
            Rbp => RegFamily::Rbp,
            Rsp => RegFamily::Rsp,
            R8 | R8d | R8w | R8b => RegFamily::R8,
            R9 | R9d | R9w | R9b => RegFamily::R9,
            R10 | R10d | R10w | R10b => RegFamily::R10,
            R11 | R11d | R11w | R11b => RegFamily::R11,
            R12 | R12d | R12w | R12b => RegFamily::R12,
            R13 | R13d | R13w | R13b => RegFamily::R13,
            R14 | R14d | R14w | R14b => RegFamily::R14,
            R15 | R15d | R15w | R15b => RegFamily::R15,
            Xmm(n) => RegFamily::Xmm(n),
        }
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Reg::*;
        match self {
            Xmm(n) => write!(f, "xmm{n}"),
            other => f.write_str(match other {
                Rax => "rax",
                Eax => "eax",
                Ax => "ax",
                Al => "al",
                Rbx => "rbx",
                Ebx => "ebx",
                Bx => "bx",
                Bl => "bl",
                Rcx => "rcx",
                Ecx => "ecx",
                Cx => "cx",
                Cl => "cl",
                Rdx => "rdx",
                Edx => "edx",
                Dx => "dx",
                Dl => "dl",
                Rsi => "rsi",
                Esi => "esi",
                Si => "si",
                Sil => "sil",
                Rdi => "rdi",
                Edi => "edi",
                Di => "di",
                Dil => "dil",
                Rbp => "rbp",
                Rsp => "rsp",
                R8 => "r8",
                R8d => "r8d",
                R8w => "r8w",
                R8b => "r8b",
                R9 => "r9",
                R9d => "r9d",
                R9w => "r9w",
                R9b => "r9b",
                R10 => "r10",
                R10d => "r10d",
                R10w => "r10w",
                R10b => "r10b",
                R11 => "r11",
                R11d => "r11d",
                R11w => "r11w",
                R11b => "r11b",
                R12 => "r12",
                R12d => "r12d",
                R12w => "r12w",
                R12b => "r12b",
                R13 => "r13",
                R13d => "r13d",
                R13w => "r13w",
                R13b => "r13b",
                R14 => "r14",
                R14d => "r14d",
                R14w => "r14w",
                R14b => "r14b",
                R15 => "r15",
                R15d => "r15d",
                R15w => "r15w",
                R15b => "r15b",
                Xmm(_) => unreachable!(),
            }),
        }
    }
}
