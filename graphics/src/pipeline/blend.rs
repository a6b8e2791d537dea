//! Color blending configuration for render pipeline attachments.

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// 0.0
    #[default]
    Zero,
    /// 1.0
    One,
    /// Source color
    Src,
    /// 1 - source color
    OneMinusSrc,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination color
    Dst,
    /// 1 - destination color
    OneMinusDst,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
    /// min(source alpha, 1 - destination alpha)
    SrcAlphaSaturated,
    /// Constant color
    Constant,
    /// 1 - constant color
    OneMinusConstant,
}

/// Blend operation for combining colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
    /// min(source, destination)
    Min,
    /// max(source, destination)
    Max,
}

/// Blend component configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Source factor.
    pub src_factor: BlendFactor,
    /// Destination factor.
    pub dst_factor: BlendFactor,
    /// Blend operation.
    pub operation: BlendOperation,
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self::REPLACE
    }
}

impl BlendComponent {
    /// Source replaces destination.
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };

    /// Standard "source over" alpha compositing.
    pub const OVER: Self = Self {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };

    /// Whether this component leaves the source unchanged.
    pub fn is_replace(&self) -> bool {
        *self == Self::REPLACE
    }
}

/// Blend state for color blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendState {
    /// Color blend component.
    pub color: BlendComponent,
    /// Alpha blend component.
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Opaque output, source replaces destination.
    pub fn opaque() -> Self {
        Self::default()
    }

    /// Standard alpha blending (src over dst) for color; alpha accumulates.
    pub fn alpha_blending() -> Self {
        Self {
            color: BlendComponent::OVER,
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
        }
    }

    /// Additive blending.
    pub fn additive() -> Self {
        let add = BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        };
        Self {
            color: add,
            alpha: add,
        }
    }

    /// Whether blending can be disabled entirely for this state.
    pub fn is_opaque(&self) -> bool {
        self.color.is_replace() && self.alpha.is_replace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_presets() {
        assert!(BlendState::opaque().is_opaque());
        assert!(!BlendState::alpha_blending().is_opaque());
        assert_eq!(BlendState::alpha_blending().color, BlendComponent::OVER);
        assert_eq!(BlendState::additive().alpha.dst_factor, BlendFactor::One);
    }
}
