/// Default `obsp` key of the kNN connectivities
pub const CONNECTIVITIES: &str = "connectivities";

/// Primary matrix pseudo-layer
pub const X_LAYER: &str = "X";

pub const CT_SCORE: &str = "ct_score";
pub const CT_PSEUDOTIME: &str = "ct_pseudotime";
pub const CT_NUM_EXP_GENES: &str = "ct_num_exp_genes";
pub const CT_GENE_CORR: &str = "ct_gene_corr";
pub const CT_POS_CORRELATES: &str = "ct_pos_correlates";
pub const CT_NEG_CORRELATES: &str = "ct_neg_correlates";
pub const CT_PARAMS: &str = "ct_params";

/// `T_bwd` for backward kernels, `T_fwd` otherwise
pub fn transition_key(backward: bool) -> &'static str {
    if backward {
        "T_bwd"
    } else {
        "T_fwd"
    }
}

pub fn params_key(key: &str) -> String {
    format!("{}_params", key)
}

/// `obsm` key of a projection, e.g., `T_fwd_umap`
pub fn projection_key(key: &str, basis: &str) -> String {
    format!("{}_{}", key, basis)
}
