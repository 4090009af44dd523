//! Reference molecular Hamiltonians.

use crate::error::OpResult;
use crate::fermion::FermionHamiltonian;
use crate::source::parse_fermion_source;

/// H2 in the STO-3G basis at 0.7414 Å, four spin-orbitals.
pub const H2_STO3G: &str = r"__qpu__ h2() {
   0.7137758743754461
   -1.252477303982147 0 1 0 0
   0.337246551663004 0 1 1 1 1 0 0 0
   0.0906437679061661 0 1 1 1 3 0 2 0
   0.0906437679061661 0 1 2 1 0 0 2 0
   0.3317360224302783 0 1 2 1 2 0 0 0
   0.0906437679061661 0 1 3 1 1 0 2 0
   0.3317360224302783 0 1 3 1 3 0 0 0
   0.337246551663004 1 1 0 1 0 0 1 0
   0.0906437679061661 1 1 0 1 2 0 3 0
   -1.252477303982147 1 1 1 0
   0.0906437679061661 1 1 2 1 0 0 3 0
   0.3317360224302783 1 1 2 1 2 0 1 0
   0.0906437679061661 1 1 3 1 1 0 3 0
   0.3317360224302783 1 1 3 1 3 0 1 0
   0.3317360224302783 2 1 0 1 0 0 2 0
   0.0906437679061661 2 1 0 1 2 0 0 0
   0.3317360224302783 2 1 1 1 1 0 2 0
   0.0906437679061661 2 1 1 1 3 0 0 0
   -0.4759344611440753 2 1 2 0
   0.0906437679061661 2 1 3 1 1 0 0 0
   0.3486989747346679 2 1 3 1 3 0 2 0
   0.3317360224302783 3 1 0 1 0 0 3 0
   0.0906437679061661 3 1 0 1 2 0 1 0
   0.3317360224302783 3 1 1 1 1 0 3 0
   0.0906437679061661 3 1 1 1 3 0 1 0
   0.0906437679061661 3 1 2 1 0 0 1 0
   0.3486989747346679 3 1 2 1 2 0 3 0
   -0.4759344611440753 3 1 3 0
}
";

/// Hartree-Fock energy of [`H2_STO3G`] with both electrons in orbitals 0 and 1.
pub const H2_HARTREE_FOCK_ENERGY: f64 = -1.116_685_630_262_839_8;

/// Energy of [`H2_STO3G`] in the empty (all-zero) qubit state.
pub const H2_VACUUM_ENERGY: f64 = 0.713_775_874_375_445_9;

/// Parsed [`H2_STO3G`].
pub fn h2_sto3g() -> OpResult<FermionHamiltonian> {
    parse_fermion_source(H2_STO3G)
}
